//! Surf forecast monitoring service.
//!
//! Reads a break's six-day forecast page, places every period on a fixed
//! 7-day × 3-period grid, and rates each slot against a "good" and a
//! "perfect" profile.
//!
//! Module map, leaf-first:
//! - `compass`: 16-point directions and offshore-wind geometry
//! - `alert::criteria`: favorability profiles and slot evaluation
//! - `ingest::surf_forecast`: page fetch and markup extraction
//! - `analysis::grid`: normalization onto the forecast grid
//! - `conditions`: snapshot assembly; what callers invoke
//!
//! Supporting modules: `model`, `config`, `logging`, `alert::cooldown`,
//! `verify`, `dev_mode`.

pub mod alert;
pub mod analysis;
pub mod compass;
pub mod conditions;
pub mod config;
pub mod dev_mode;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod verify;

pub use conditions::{assemble_snapshot, scrape_beach, scrape_surf_conditions};
pub use model::{ConditionsSnapshot, FetchError, ScrapeError};
