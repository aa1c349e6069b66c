/// Retrieval of forecast data from remote sources.
///
/// Submodules:
/// - `surf_forecast`: six-day forecast page client and markup extractor.

pub mod surf_forecast;
