/// 16-point compass directions and wrap-around distance arithmetic.
///
/// Used to decide whether the wind blows roughly against the swell
/// (offshore). All functions here are total: an `Unknown` direction never
/// panics, it simply never compares as favorable.

use serde::{Serialize, Serializer};

/// Number of points on the compass rose.
pub const COMPASS_POINTS: u8 = 16;

/// Index distance of the exact opposite bearing.
pub const OPPOSITE_OFFSET: u8 = COMPASS_POINTS / 2;

/// A 16-point compass direction, clockwise from north, or `Unknown` when the
/// source text could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompassDirection {
    N,
    NNE,
    NE,
    ENE,
    E,
    ESE,
    SE,
    SSE,
    S,
    SSW,
    SW,
    WSW,
    W,
    WNW,
    NW,
    NNW,
    Unknown,
}

/// Known points in index order.
const POINTS: [CompassDirection; COMPASS_POINTS as usize] = [
    CompassDirection::N,
    CompassDirection::NNE,
    CompassDirection::NE,
    CompassDirection::ENE,
    CompassDirection::E,
    CompassDirection::ESE,
    CompassDirection::SE,
    CompassDirection::SSE,
    CompassDirection::S,
    CompassDirection::SSW,
    CompassDirection::SW,
    CompassDirection::WSW,
    CompassDirection::W,
    CompassDirection::WNW,
    CompassDirection::NW,
    CompassDirection::NNW,
];

impl CompassDirection {
    /// Parses direction letters such as "SW" or " nnw ". Anything else,
    /// including the source's own "N/A", becomes `Unknown`.
    pub fn from_letters(text: &str) -> Self {
        let letters = text.trim().to_ascii_uppercase();
        POINTS
            .iter()
            .copied()
            .find(|point| point.letters() == letters)
            .unwrap_or(CompassDirection::Unknown)
    }

    /// Direction at `index` (0 = N, clockwise). Out-of-range → `Unknown`.
    pub fn from_index(index: u8) -> Self {
        POINTS
            .get(index as usize)
            .copied()
            .unwrap_or(CompassDirection::Unknown)
    }

    /// Circular index 0–15, or `None` for `Unknown`.
    pub fn index(self) -> Option<u8> {
        POINTS.iter().position(|p| *p == self).map(|i| i as u8)
    }

    pub fn is_known(self) -> bool {
        self != CompassDirection::Unknown
    }

    pub fn letters(self) -> &'static str {
        match self {
            CompassDirection::N => "N",
            CompassDirection::NNE => "NNE",
            CompassDirection::NE => "NE",
            CompassDirection::ENE => "ENE",
            CompassDirection::E => "E",
            CompassDirection::ESE => "ESE",
            CompassDirection::SE => "SE",
            CompassDirection::SSE => "SSE",
            CompassDirection::S => "S",
            CompassDirection::SSW => "SSW",
            CompassDirection::SW => "SW",
            CompassDirection::WSW => "WSW",
            CompassDirection::W => "W",
            CompassDirection::WNW => "WNW",
            CompassDirection::NW => "NW",
            CompassDirection::NNW => "NNW",
            CompassDirection::Unknown => "N/A",
        }
    }

    /// The bearing 180° away. `Unknown` stays `Unknown`.
    pub fn opposite(self) -> Self {
        match self.index() {
            Some(i) => Self::from_index((i + OPPOSITE_OFFSET) % COMPASS_POINTS),
            None => CompassDirection::Unknown,
        }
    }
}

impl std::fmt::Display for CompassDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.letters())
    }
}

impl Serialize for CompassDirection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.letters())
    }
}

impl<'de> serde::Deserialize<'de> for CompassDirection {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(CompassDirection::from_letters(&text))
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Clockwise steps from `from` to `to`: `(to - from + 16) mod 16`.
///
/// Returns `None` if either direction is `Unknown`.
pub fn circular_distance(from: CompassDirection, to: CompassDirection) -> Option<u8> {
    let from = from.index()?;
    let to = to.index()?;
    Some((to + COMPASS_POINTS - from) % COMPASS_POINTS)
}

/// Returns `true` when the wind blows from within `tolerance` points of the
/// bearing opposite the swell, i.e. offshore.
///
/// The distance is measured from swell to wind and accepted when it lies in
/// `[8 - tolerance, 8 + tolerance]`, both ends inclusive. A tolerance of 8 or
/// more accepts every known pair. `Unknown` on either side is never favorable.
pub fn is_favorable_relative_direction(
    swell: CompassDirection,
    wind: CompassDirection,
    tolerance: u8,
) -> bool {
    let Some(distance) = circular_distance(swell, wind) else {
        return false;
    };
    let min = OPPOSITE_OFFSET.saturating_sub(tolerance);
    let max = OPPOSITE_OFFSET.saturating_add(tolerance);
    (min..=max).contains(&distance)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
