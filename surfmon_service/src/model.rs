/// Core data types for the surf forecast monitoring service.
///
/// This module defines the shared domain model imported by all other modules:
/// readings, period slots, the fixed 7×3 forecast grid, the conditions
/// snapshot handed back to callers, and the error taxonomy. It contains no
/// I/O and only the small amount of logic needed to keep the grid shape fixed.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::compass::CompassDirection;

// ---------------------------------------------------------------------------
// Grid shape
// ---------------------------------------------------------------------------

/// Number of forecast days covered by the six_day page (today + 6).
pub const FORECAST_DAYS: usize = 7;

/// Morning, afternoon and night.
pub const PERIODS_PER_DAY: usize = 3;

/// Upper bound on the wave cells the extractor will read.
pub const MAX_FORECAST_CELLS: usize = FORECAST_DAYS * PERIODS_PER_DAY;

/// Rating shown when the page carries no star images.
pub const RATING_UNAVAILABLE: &str = "N/A";

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// Swell conditions for one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaveReading {
    /// Meters.
    pub height: f64,
    /// Seconds.
    pub period: f64,
    pub direction: CompassDirection,
}

/// Wind conditions for one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindReading {
    /// km/h.
    pub speed: f64,
    pub direction: CompassDirection,
}

/// Time of day within a forecast day, in page order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodOfDay {
    Morning,
    Afternoon,
    Night,
}

impl PeriodOfDay {
    pub const ALL: [PeriodOfDay; PERIODS_PER_DAY] =
        [PeriodOfDay::Morning, PeriodOfDay::Afternoon, PeriodOfDay::Night];

    /// Maps `index mod 3` onto a period; anything past 2 wraps.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % PERIODS_PER_DAY]
    }

    pub fn key(self) -> &'static str {
        match self {
            PeriodOfDay::Morning => "morning",
            PeriodOfDay::Afternoon => "afternoon",
            PeriodOfDay::Night => "night",
        }
    }
}

impl std::fmt::Display for PeriodOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// One forecast observation for a specific day and time of day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSlot {
    pub wave: WaveReading,
    pub wind: WindReading,
    /// Local midnight of the slot's calendar day.
    pub timestamp: DateTime<FixedOffset>,
    /// e.g. "Fri, Oct 16"
    pub formatted_date: String,
    pub is_good: bool,
    pub is_perfect: bool,
}

// ---------------------------------------------------------------------------
// Forecast grid
// ---------------------------------------------------------------------------

/// The three period slots of one day. A slot is `None` when the page had no
/// usable cell for it; it is never left out of the serialized output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DayForecast {
    pub morning: Option<PeriodSlot>,
    pub afternoon: Option<PeriodSlot>,
    pub night: Option<PeriodSlot>,
}

impl DayForecast {
    pub fn slot(&self, period: PeriodOfDay) -> Option<&PeriodSlot> {
        match period {
            PeriodOfDay::Morning => self.morning.as_ref(),
            PeriodOfDay::Afternoon => self.afternoon.as_ref(),
            PeriodOfDay::Night => self.night.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, period: PeriodOfDay) -> &mut Option<PeriodSlot> {
        match period {
            PeriodOfDay::Morning => &mut self.morning,
            PeriodOfDay::Afternoon => &mut self.afternoon,
            PeriodOfDay::Night => &mut self.night,
        }
    }
}

/// Returns the grid key for a day offset: "today", "day2", … "day7".
pub fn day_key(day_offset: usize) -> String {
    if day_offset == 0 {
        "today".to_string()
    } else {
        format!("day{}", day_offset + 1)
    }
}

/// Seven days of forecast, always fully keyed.
///
/// Backed by a fixed-size array so the shape cannot drift; serializes as a
/// map `{ "today": {...}, "day2": {...}, ..., "day7": {...} }`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailedForecast {
    days: [DayForecast; FORECAST_DAYS],
}

impl DetailedForecast {
    pub fn day(&self, day_offset: usize) -> Option<&DayForecast> {
        self.days.get(day_offset)
    }

    pub fn day_mut(&mut self, day_offset: usize) -> Option<&mut DayForecast> {
        self.days.get_mut(day_offset)
    }

    /// Looks a day up by its key ("today", "day2", …).
    pub fn day_by_key(&self, key: &str) -> Option<&DayForecast> {
        (0..FORECAST_DAYS)
            .find(|&offset| day_key(offset) == key)
            .and_then(|offset| self.day(offset))
    }

    /// Days in order, paired with their keys.
    pub fn iter(&self) -> impl Iterator<Item = (String, &DayForecast)> {
        self.days
            .iter()
            .enumerate()
            .map(|(offset, day)| (day_key(offset), day))
    }

    /// Number of populated slots across the whole grid.
    pub fn populated_slots(&self) -> usize {
        self.days
            .iter()
            .flat_map(|day| PeriodOfDay::ALL.into_iter().filter_map(move |p| day.slot(p)))
            .count()
    }
}

impl Serialize for DetailedForecast {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FORECAST_DAYS))?;
        for (key, day) in self.iter() {
            map.serialize_entry(&key, day)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The complete result of one evaluation: current readings plus the grid.
///
/// The flat fields mirror the first populated slot of the grid; when no slot
/// could be parsed they are zero / `N/A` and both verdicts are false.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionsSnapshot {
    pub wave_height: f64,
    pub wave_period: f64,
    pub wave_direction: CompassDirection,
    pub wind_speed: f64,
    pub wind_direction: CompassDirection,
    /// Water temperature, °C. 0 when the page did not state it.
    pub temperature: f64,
    /// "N stars" or "N/A".
    pub rating: String,
    pub timestamp: DateTime<Utc>,
    pub is_good: bool,
    pub is_perfect: bool,
    pub detailed_forecast: DetailedForecast,
}

impl ConditionsSnapshot {
    /// Slots rated good or perfect, in grid order, as
    /// `(day key, period, slot)`. Used to compose notifications.
    pub fn favorable_slots(&self) -> Vec<(String, PeriodOfDay, &PeriodSlot)> {
        self.detailed_forecast
            .iter()
            .flat_map(|(key, day)| {
                PeriodOfDay::ALL.into_iter().filter_map(move |period| {
                    day.slot(period)
                        .filter(|slot| slot.is_good || slot.is_perfect)
                        .map(|slot| (key.clone(), period, slot))
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Top-level failures retrieving the forecast page. Fatal for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The request could not be sent or the connection failed.
    Transport(String),
    /// Non-2xx HTTP response from the forecast source.
    HttpStatus(u16),
    /// The response arrived but its body could not be read.
    Body(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "Transport error: {}", msg),
            FetchError::HttpStatus(code) => write!(f, "HTTP error: {}", code),
            FetchError::Body(msg) => write!(f, "Body read error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

/// The only error that escapes the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeError {
    pub beach: String,
    pub cause: FetchError,
}

impl std::fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Failed to scrape surf conditions for {}: {}",
            self.beach, self.cause
        )
    }
}

impl std::error::Error for ScrapeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

/// Failure decoding one wave cell. Recovered locally: the slot becomes null.
#[derive(Debug, Clone, PartialEq)]
pub enum CellParseError {
    /// The cell carried no `data-wind` attribute.
    MissingWindPayload,
    /// The `data-wind` attribute was not the expected JSON shape.
    MalformedWindPayload(String),
    /// Neither the swell icon nor the swell state gave a wave height.
    MissingWaveHeight,
}

impl std::fmt::Display for CellParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellParseError::MissingWindPayload => write!(f, "Parse error: no wind payload"),
            CellParseError::MalformedWindPayload(msg) => {
                write!(f, "Parse error: malformed wind payload: {}", msg)
            }
            CellParseError::MissingWaveHeight => write!(f, "Parse error: no wave height"),
        }
    }
}

impl std::error::Error for CellParseError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_keys_follow_today_then_day_n() {
        let keys: Vec<String> = (0..FORECAST_DAYS).map(day_key).collect();
        assert_eq!(
            keys,
            vec!["today", "day2", "day3", "day4", "day5", "day6", "day7"]
        );
    }

    #[test]
    fn test_day_by_key_round_trips_every_key() {
        let grid = DetailedForecast::default();
        for (key, _) in grid.iter() {
            assert!(grid.day_by_key(&key).is_some(), "key '{}' should resolve", key);
        }
        assert!(grid.day_by_key("day1").is_none(), "day1 is not a valid key");
        assert!(grid.day_by_key("day8").is_none(), "grid only has 7 days");
        assert!(grid.day_by_key("tomorrow").is_none());
    }

    #[test]
    fn test_day_by_key_rejects_non_canonical_spellings() {
        let grid = DetailedForecast::default();
        for key in ["day02", "day+2", "Day2", "day2 ", "day0", "today2", ""] {
            assert!(grid.day_by_key(key).is_none(), "'{}' is not a grid key", key);
        }
    }

    #[test]
    fn test_empty_grid_serializes_with_every_key_and_null_slots() {
        let json = serde_json::to_value(DetailedForecast::default()).unwrap();
        let days = json.as_object().expect("grid should serialize as a map");
        assert_eq!(days.len(), FORECAST_DAYS);
        for (key, day) in days {
            let periods = day.as_object().expect("day should serialize as a map");
            assert_eq!(periods.len(), PERIODS_PER_DAY, "day '{}' period count", key);
            for period in PeriodOfDay::ALL {
                assert!(
                    periods.get(period.key()).is_some_and(|v| v.is_null()),
                    "{}.{} should be an explicit null",
                    key,
                    period
                );
            }
        }
    }

    #[test]
    fn test_period_of_day_from_index_wraps() {
        assert_eq!(PeriodOfDay::from_index(0), PeriodOfDay::Morning);
        assert_eq!(PeriodOfDay::from_index(4), PeriodOfDay::Afternoon);
        assert_eq!(PeriodOfDay::from_index(20), PeriodOfDay::Night);
    }

    #[test]
    fn test_scrape_error_exposes_fetch_error_as_source() {
        use std::error::Error;
        let err = ScrapeError {
            beach: "Bells-Beach".to_string(),
            cause: FetchError::HttpStatus(503),
        };
        assert_eq!(
            err.to_string(),
            "Failed to scrape surf conditions for Bells-Beach: HTTP error: 503"
        );
        assert!(err.source().is_some());
    }
}
