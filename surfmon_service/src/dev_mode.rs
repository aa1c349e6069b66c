/// Development mode utilities for working with saved forecast pages
///
/// When the live site is unavailable (or you are iterating on the extractor
/// and don't want to hit it on every run), point the service at a page saved
/// from the browser and replay it through the same pipeline.

use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};

use crate::alert::criteria::Profiles;
use crate::conditions::assemble_snapshot;
use crate::ingest::surf_forecast::parse_forecast_page;
use crate::logging::{self, Source};
use crate::model::ConditionsSnapshot;

/// Configuration for replaying a saved page
pub struct DevMode {
    /// Saved six_day page
    pub page_path: PathBuf,
    /// Treat the page as if fetched at this moment. `None` means now.
    pub as_of: Option<DateTime<Utc>>,
}

impl DevMode {
    /// Create a new dev mode configuration
    pub fn new(page_path: impl Into<PathBuf>) -> Self {
        Self {
            page_path: page_path.into(),
            as_of: None,
        }
    }

    pub fn as_of(mut self, at: DateTime<Utc>) -> Self {
        self.as_of = Some(at);
        self
    }

    /// Read the saved page
    pub fn load_page(&self) -> std::io::Result<String> {
        std::fs::read_to_string(&self.page_path)
    }

    /// Evaluate the saved page as the named beach
    pub fn replay(&self, beach: &str, profiles: &Profiles) -> std::io::Result<ConditionsSnapshot> {
        let html = self.load_page()?;
        logging::info(
            Source::System,
            Some(beach),
            &format!("replaying saved page {}", self.page_path.display()),
        );
        let raw = parse_forecast_page(&html, Some(beach));
        let now = self.as_of.unwrap_or_else(Utc::now);
        Ok(assemble_snapshot(&raw, profiles, now, &Local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_mode_creation() {
        let dev = DevMode::new("pages/six_day.html");
        assert_eq!(dev.page_path, PathBuf::from("pages/six_day.html"));
        assert!(dev.as_of.is_none());
    }

    #[test]
    fn test_replay_missing_page_is_io_error() {
        let dev = DevMode::new("/nonexistent/six_day.html");
        assert!(dev.replay("Bells-Beach", &Profiles::reference()).is_err());
    }

    #[test]
    fn test_replay_saved_page() {
        let path = std::env::temp_dir().join(format!("surfmon_replay_{}.html", std::process::id()));
        std::fs::write(&path, "<p>The sea temperature is 16&deg;C</p>").unwrap();

        let at = chrono::TimeZone::with_ymd_and_hms(&Utc, 2024, 5, 1, 13, 0, 0).unwrap();
        let snap = DevMode::new(&path)
            .as_of(at)
            .replay("Bells-Beach", &Profiles::reference())
            .expect("saved page should replay");
        std::fs::remove_file(&path).ok();

        assert_eq!(snap.timestamp, at);
        assert_eq!(snap.temperature, 16.0);
        assert_eq!(snap.detailed_forecast.populated_slots(), 0);
    }
}
