//! Surf conditions snapshot assembly.
//!
//! This is the entry point the rest of the world calls: fetch the forecast
//! page for a beach, extract it, normalize it onto the grid and fold the
//! result into one `ConditionsSnapshot`. Only a failed fetch is an error;
//! anything wrong inside the page shows up as null slots and default scalars.

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::alert::criteria::{Assessment, Profiles};
use crate::analysis::grid::build_grid;
use crate::compass::CompassDirection;
use crate::config::SurfConfig;
use crate::ingest::surf_forecast::{RawForecast, fetch_forecast};
use crate::logging::{self, Source};
use crate::model::{ConditionsSnapshot, MAX_FORECAST_CELLS, ScrapeError};

/// Folds an extracted page into a snapshot.
///
/// `now` stamps the snapshot and, seen in `tz`, fixes which calendar day is
/// "today" for the grid.
pub fn assemble_snapshot<Tz: TimeZone>(
    raw: &RawForecast,
    profiles: &Profiles,
    now: DateTime<Utc>,
    tz: &Tz,
) -> ConditionsSnapshot {
    let today = now.with_timezone(tz).date_naive();
    let grid = build_grid(&raw.cells, profiles, today, tz);

    let mut snapshot = ConditionsSnapshot {
        wave_height: 0.0,
        wave_period: 0.0,
        wave_direction: CompassDirection::Unknown,
        wind_speed: 0.0,
        wind_direction: CompassDirection::Unknown,
        temperature: raw.temperature.unwrap_or(0.0),
        rating: raw.rating.clone(),
        timestamp: now,
        is_good: false,
        is_perfect: false,
        detailed_forecast: grid.forecast,
    };

    if let Some(current) = grid.current {
        let Assessment { is_good, is_perfect } = current.assessment;
        snapshot.wave_height = current.wave.height;
        snapshot.wave_period = current.wave.period;
        snapshot.wave_direction = current.wave.direction;
        snapshot.wind_speed = current.wind.speed;
        snapshot.wind_direction = current.wind.direction;
        snapshot.is_good = is_good;
        snapshot.is_perfect = is_perfect;
    }

    snapshot
}

/// Fetches and evaluates one beach. Dates are anchored in the system time
/// zone.
pub fn scrape_beach(
    client: &reqwest::blocking::Client,
    base_url: &str,
    beach: &str,
    profiles: &Profiles,
) -> Result<ConditionsSnapshot, ScrapeError> {
    let raw = fetch_forecast(client, base_url, beach).map_err(|cause| {
        logging::log_fetch_failure(beach, &cause);
        ScrapeError {
            beach: beach.to_string(),
            cause,
        }
    })?;

    let snapshot = assemble_snapshot(&raw, profiles, Utc::now(), &Local);

    logging::info(
        Source::Forecast,
        Some(beach),
        &format!(
            "{} of {} slots populated; now {}m {}s {}, wind {}km/h {} (good: {}, perfect: {})",
            snapshot.detailed_forecast.populated_slots(),
            MAX_FORECAST_CELLS,
            snapshot.wave_height,
            snapshot.wave_period,
            snapshot.wave_direction,
            snapshot.wind_speed,
            snapshot.wind_direction,
            snapshot.is_good,
            snapshot.is_perfect
        ),
    );

    Ok(snapshot)
}

/// Evaluates the configured beach with the configured profiles.
pub fn scrape_surf_conditions(
    client: &reqwest::blocking::Client,
    config: &SurfConfig,
) -> Result<ConditionsSnapshot, ScrapeError> {
    scrape_beach(client, &config.base_url, &config.beach, &config.profiles())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
