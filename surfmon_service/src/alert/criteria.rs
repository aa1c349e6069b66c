//! Favorability criteria and slot evaluation.
//!
//! A `CriteriaProfile` is one tier of "worth paddling out": wave height and
//! period windows, acceptable swell directions, a wind speed ceiling and how
//! far the wind may stray from dead offshore. Profiles are validated once when
//! they are built (or deserialized from config), so evaluation itself never
//! needs to second-guess them.
//!
//! The "good" and "perfect" tiers are evaluated independently. Nothing here
//! requires a perfect slot to also be good; if the configured profiles are
//! nested that falls out naturally, and if they are not, both verdicts are
//! reported as computed.

use serde::Deserialize;

use crate::compass::{CompassDirection, is_favorable_relative_direction};
use crate::logging::{self, Source};
use crate::model::{PeriodSlot, WaveReading, WindReading};

/// Largest meaningful offshore tolerance: at 8 every bearing is accepted.
pub const MAX_WIND_TOLERANCE: u8 = 8;

// ---------------------------------------------------------------------------
// Profile types
// ---------------------------------------------------------------------------

/// Inclusive numeric window.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Both ends inclusive. NaN is never contained.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Reasons a profile is rejected at construction time.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileError {
    /// A bound is NaN or infinite.
    NonFinite(&'static str),
    /// A bound is below zero.
    Negative(&'static str),
    /// `min` is greater than `max`.
    InvertedRange { field: &'static str, min: f64, max: f64 },
    /// Tolerance beyond half the compass.
    ToleranceTooLarge(u8),
    /// A preferred direction could not be resolved to a compass point.
    UnknownDirection(String),
}

impl std::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileError::NonFinite(field) => write!(f, "{} must be a finite number", field),
            ProfileError::Negative(field) => write!(f, "{} must not be negative", field),
            ProfileError::InvertedRange { field, min, max } => {
                write!(f, "{} range is inverted: min {} > max {}", field, min, max)
            }
            ProfileError::ToleranceTooLarge(t) => write!(
                f,
                "wind direction tolerance {} exceeds {}",
                t, MAX_WIND_TOLERANCE
            ),
            ProfileError::UnknownDirection(text) => {
                write!(f, "'{}' is not a 16-point compass direction", text)
            }
        }
    }
}

impl std::error::Error for ProfileError {}

/// One favorability tier. Fields are private; build through
/// [`CriteriaProfile::new`] or deserialize, both of which validate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawProfile")]
pub struct CriteriaProfile {
    wave_height: ValueRange,
    wave_period: ValueRange,
    preferred_wave_directions: Vec<CompassDirection>,
    max_wind_speed: f64,
    wind_direction_tolerance: u8,
}

/// Unvalidated profile as written in the config file.
#[derive(Debug, Deserialize)]
struct RawProfile {
    wave_height: ValueRange,
    wave_period: ValueRange,
    preferred_wave_directions: Vec<String>,
    max_wind_speed: f64,
    wind_direction_tolerance: u8,
}

impl TryFrom<RawProfile> for CriteriaProfile {
    type Error = ProfileError;

    fn try_from(raw: RawProfile) -> Result<Self, Self::Error> {
        let directions = raw
            .preferred_wave_directions
            .iter()
            .map(|text| match CompassDirection::from_letters(text) {
                CompassDirection::Unknown => Err(ProfileError::UnknownDirection(text.clone())),
                dir => Ok(dir),
            })
            .collect::<Result<Vec<_>, _>>()?;

        CriteriaProfile::new(
            raw.wave_height,
            raw.wave_period,
            &directions,
            raw.max_wind_speed,
            raw.wind_direction_tolerance,
        )
    }
}

fn validate_range(field: &'static str, range: ValueRange) -> Result<(), ProfileError> {
    if !range.min.is_finite() || !range.max.is_finite() {
        return Err(ProfileError::NonFinite(field));
    }
    if range.min < 0.0 {
        return Err(ProfileError::Negative(field));
    }
    if range.min > range.max {
        return Err(ProfileError::InvertedRange {
            field,
            min: range.min,
            max: range.max,
        });
    }
    Ok(())
}

impl CriteriaProfile {
    pub fn new(
        wave_height: ValueRange,
        wave_period: ValueRange,
        preferred_wave_directions: &[CompassDirection],
        max_wind_speed: f64,
        wind_direction_tolerance: u8,
    ) -> Result<Self, ProfileError> {
        validate_range("wave_height", wave_height)?;
        validate_range("wave_period", wave_period)?;
        if !max_wind_speed.is_finite() {
            return Err(ProfileError::NonFinite("max_wind_speed"));
        }
        if max_wind_speed < 0.0 {
            return Err(ProfileError::Negative("max_wind_speed"));
        }
        if wind_direction_tolerance > MAX_WIND_TOLERANCE {
            return Err(ProfileError::ToleranceTooLarge(wind_direction_tolerance));
        }

        let mut directions: Vec<CompassDirection> = Vec::new();
        for dir in preferred_wave_directions {
            if !dir.is_known() {
                return Err(ProfileError::UnknownDirection(dir.letters().to_string()));
            }
            if !directions.contains(dir) {
                directions.push(*dir);
            }
        }

        Ok(Self {
            wave_height,
            wave_period,
            preferred_wave_directions: directions,
            max_wind_speed,
            wind_direction_tolerance,
        })
    }

    /// The reference "good" tier: 1–2 m, 12–21 s, S/SW/W swell, wind ≤ 15 km/h
    /// within 2 points of offshore.
    pub fn reference_good() -> Self {
        Self {
            wave_height: ValueRange::new(1.0, 2.0),
            wave_period: ValueRange::new(12.0, 21.0),
            preferred_wave_directions: vec![
                CompassDirection::S,
                CompassDirection::SW,
                CompassDirection::W,
            ],
            max_wind_speed: 15.0,
            wind_direction_tolerance: 2,
        }
    }

    /// The reference "perfect" tier: 1–1.5 m, 15–21 s, S/SW swell,
    /// wind ≤ 10 km/h within 1 point of offshore.
    pub fn reference_perfect() -> Self {
        Self {
            wave_height: ValueRange::new(1.0, 1.5),
            wave_period: ValueRange::new(15.0, 21.0),
            preferred_wave_directions: vec![CompassDirection::S, CompassDirection::SW],
            max_wind_speed: 10.0,
            wind_direction_tolerance: 1,
        }
    }

    pub fn wave_height(&self) -> ValueRange {
        self.wave_height
    }

    pub fn wave_period(&self) -> ValueRange {
        self.wave_period
    }

    pub fn preferred_wave_directions(&self) -> &[CompassDirection] {
        &self.preferred_wave_directions
    }

    pub fn max_wind_speed(&self) -> f64 {
        self.max_wind_speed
    }

    pub fn wind_direction_tolerance(&self) -> u8 {
        self.wind_direction_tolerance
    }

    /// Evaluates each condition separately.
    pub fn checks(&self, wave: &WaveReading, wind: &WindReading) -> ConditionChecks {
        ConditionChecks {
            wave_height: self.wave_height.contains(wave.height),
            wave_period: self.wave_period.contains(wave.period),
            wave_direction: wave.direction.is_known()
                && self.preferred_wave_directions.contains(&wave.direction),
            wind_speed: wind.speed <= self.max_wind_speed,
            wind_direction: is_favorable_relative_direction(
                wave.direction,
                wind.direction,
                self.wind_direction_tolerance,
            ),
        }
    }

    /// True only when every condition holds.
    pub fn matches(&self, wave: &WaveReading, wind: &WindReading) -> bool {
        self.checks(wave, wind).all()
    }
}

/// Per-condition outcome of one profile evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionChecks {
    pub wave_height: bool,
    pub wave_period: bool,
    pub wave_direction: bool,
    pub wind_speed: bool,
    pub wind_direction: bool,
}

impl ConditionChecks {
    pub fn all(&self) -> bool {
        self.wave_height
            && self.wave_period
            && self.wave_direction
            && self.wind_speed
            && self.wind_direction
    }
}

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// The two configured tiers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Profiles {
    pub good: CriteriaProfile,
    pub perfect: CriteriaProfile,
}

impl Profiles {
    pub fn reference() -> Self {
        Self {
            good: CriteriaProfile::reference_good(),
            perfect: CriteriaProfile::reference_perfect(),
        }
    }
}

impl Default for Profiles {
    fn default() -> Self {
        Self::reference()
    }
}

/// Both verdicts for one reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Assessment {
    pub is_good: bool,
    pub is_perfect: bool,
}

/// Evaluates a populated slot against one profile.
pub fn evaluate(slot: &PeriodSlot, profile: &CriteriaProfile) -> bool {
    profile.matches(&slot.wave, &slot.wind)
}

/// Evaluates a reading against both tiers.
pub fn assess(wave: &WaveReading, wind: &WindReading, profiles: &Profiles) -> Assessment {
    let good = profiles.good.checks(wave, wind);
    let perfect = profiles.perfect.checks(wave, wind);

    logging::debug(
        Source::Forecast,
        None,
        &format!(
            "wave {}m {}s {} / wind {}km/h {} → good {:?}, perfect {:?}",
            wave.height, wave.period, wave.direction, wind.speed, wind.direction, good, perfect
        ),
    );

    Assessment {
        is_good: good.all(),
        is_perfect: perfect.all(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
