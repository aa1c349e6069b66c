//! Normalizes extracted wave cells onto the fixed 7-day × 3-period grid.
//!
//! The page lists cells in one flat run: today morning, today afternoon,
//! today night, day 2 morning, and so on. Each cell index is turned into an
//! explicit `GridPosition` before anything is placed, so a page that stops
//! halfway through a day simply leaves the rest of the grid null.
//!
//! # Clock injection
//! `build_grid` takes the local calendar date and time zone as parameters
//! instead of reading the system clock; `build_grid_local` is the wrapper
//! for production use.

use chrono::{DateTime, Days, FixedOffset, Local, NaiveDate, NaiveTime, TimeZone};

use crate::alert::criteria::{Assessment, Profiles, assess};
use crate::compass::CompassDirection;
use crate::ingest::surf_forecast::RawCell;
use crate::logging::{self, Source};
use crate::model::{
    DetailedForecast, FORECAST_DAYS, MAX_FORECAST_CELLS, PERIODS_PER_DAY, PeriodOfDay,
    PeriodSlot, WaveReading, WindReading, day_key,
};

// ---------------------------------------------------------------------------
// Grid positions
// ---------------------------------------------------------------------------

/// Where a flat cell index lands in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPosition {
    /// 0 = today.
    pub day_offset: usize,
    pub period: PeriodOfDay,
}

impl GridPosition {
    /// `None` for indices past the last period of day 7.
    pub fn from_index(index: usize) -> Option<Self> {
        if index >= MAX_FORECAST_CELLS {
            return None;
        }
        Some(Self {
            day_offset: index / PERIODS_PER_DAY,
            period: PeriodOfDay::from_index(index),
        })
    }

    pub fn day_key(&self) -> String {
        day_key(self.day_offset)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Readings and verdicts of the earliest populated slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentConditions {
    pub wave: WaveReading,
    pub wind: WindReading,
    pub assessment: Assessment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastGrid {
    pub forecast: DetailedForecast,
    /// `None` when no cell could be parsed.
    pub current: Option<CurrentConditions>,
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Midnight at the start of `date` in `tz`. On the rare day where local
/// midnight does not exist the UTC midnight is used instead.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<FixedOffset> {
    let naive = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.fixed_offset(),
        None => naive.and_utc().fixed_offset(),
    }
}

/// e.g. "Fri, Oct 16"
fn format_slot_date(midnight: &DateTime<FixedOffset>) -> String {
    midnight.format("%a, %b %-d").to_string()
}

// ---------------------------------------------------------------------------
// Grid construction
// ---------------------------------------------------------------------------

fn readings(cell: &RawCell) -> (WaveReading, WindReading) {
    let wave = WaveReading {
        height: cell.wave_height,
        period: cell.wave_period,
        direction: CompassDirection::from_letters(&cell.swell_letters),
    };
    let wind = WindReading {
        speed: cell.wind.speed,
        direction: cell
            .wind
            .letters()
            .map(CompassDirection::from_letters)
            .unwrap_or(CompassDirection::Unknown),
    };
    (wave, wind)
}

/// Builds the full 7×3 grid from extracted cells.
///
/// Every position is present in the result; positions without a cell are
/// `None`. Cells past index 20 are ignored, and if two cells claim the same
/// index the first one wins.
pub fn build_grid<Tz: TimeZone>(
    cells: &[RawCell],
    profiles: &Profiles,
    today: NaiveDate,
    tz: &Tz,
) -> ForecastGrid {
    let mut forecast = DetailedForecast::default();
    let mut current: Option<(usize, CurrentConditions)> = None;

    for cell in cells {
        let Some(position) = GridPosition::from_index(cell.index) else {
            logging::debug(
                Source::Forecast,
                None,
                &format!("cell {} lies outside the {}-day grid", cell.index, FORECAST_DAYS),
            );
            continue;
        };
        let Some(day) = forecast.day_mut(position.day_offset) else {
            continue;
        };
        let slot = day.slot_mut(position.period);
        if slot.is_some() {
            logging::debug(
                Source::Forecast,
                None,
                &format!("duplicate cell for {} {}", position.day_key(), position.period),
            );
            continue;
        }

        let (wave, wind) = readings(cell);
        let assessment = assess(&wave, &wind, profiles);
        let date = today
            .checked_add_days(Days::new(position.day_offset as u64))
            .unwrap_or(today);
        let midnight = local_midnight(tz, date);

        *slot = Some(PeriodSlot {
            wave,
            wind,
            timestamp: midnight,
            formatted_date: format_slot_date(&midnight),
            is_good: assessment.is_good,
            is_perfect: assessment.is_perfect,
        });

        if current.is_none_or(|(index, _)| cell.index < index) {
            current = Some((cell.index, CurrentConditions { wave, wind, assessment }));
        }
    }

    ForecastGrid {
        forecast,
        current: current.map(|(_, c)| c),
    }
}

/// `build_grid` anchored at today's date in the system time zone.
pub fn build_grid_local(cells: &[RawCell], profiles: &Profiles) -> ForecastGrid {
    build_grid(cells, profiles, Local::now().date_naive(), &Local)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
