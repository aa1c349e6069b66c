//! Service configuration.
//!
//! ## Loading Order
//!
//! 1. `.env` in the working directory (via dotenv), if present
//! 2. TOML file named by `SURFMON_CONFIG`, else `./surfmon.toml` if it exists
//! 3. Built-in defaults (the reference beach setup) for anything not set
//! 4. Environment overrides: `TARGET_BEACH`, `SURF_FORECAST_URL`
//!
//! ```toml
//! beach = "Bells-Beach"
//! request_timeout_secs = 20
//!
//! [good]
//! wave_height = { min = 1.0, max = 2.0 }
//! wave_period = { min = 12.0, max = 21.0 }
//! preferred_wave_directions = ["S", "SW", "W"]
//! max_wind_speed = 15.0
//! wind_direction_tolerance = 2
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::alert::cooldown::DEFAULT_COOLDOWN_MINUTES;
use crate::alert::criteria::{CriteriaProfile, Profiles};
use crate::ingest::surf_forecast::{BROWSER_USER_AGENT, SURF_FORECAST_BASE_URL};
use crate::logging::{self, LogLevel, Source};

pub const CONFIG_PATH_ENV: &str = "SURFMON_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "surfmon.toml";
pub const BEACH_ENV: &str = "TARGET_BEACH";
pub const BASE_URL_ENV: &str = "SURF_FORECAST_URL";

pub const DEFAULT_BEACH: &str = "default-beach";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    Io { path: PathBuf, message: String },
    /// The config file is not valid TOML or a profile failed validation.
    Parse { path: Option<PathBuf>, message: String },
    /// A required value is empty.
    Missing(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "cannot read config {}: {}", path.display(), message)
            }
            ConfigError::Parse { path: Some(path), message } => {
                write!(f, "invalid config {}: {}", path.display(), message)
            }
            ConfigError::Parse { path: None, message } => write!(f, "invalid config: {}", message),
            ConfigError::Missing(field) => write!(f, "config value '{}' must not be empty", field),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SurfConfig {
    /// Break identifier as used in the forecast site's URLs.
    pub beach: String,
    pub base_url: String,
    pub user_agent: String,
    /// Client-side request timeout. 0 disables it.
    pub request_timeout_secs: u64,
    pub check_cooldown_minutes: u64,
    /// "debug", "info", "warn" or "error".
    pub log_level: String,
    pub log_file: Option<String>,
    pub good: CriteriaProfile,
    pub perfect: CriteriaProfile,
}

impl Default for SurfConfig {
    fn default() -> Self {
        let profiles = Profiles::reference();
        Self {
            beach: DEFAULT_BEACH.to_string(),
            base_url: SURF_FORECAST_BASE_URL.to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            check_cooldown_minutes: DEFAULT_COOLDOWN_MINUTES,
            log_level: "info".to_string(),
            log_file: None,
            good: profiles.good,
            perfect: profiles.perfect,
        }
    }
}

impl SurfConfig {
    /// Loads configuration following the order documented at module level.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Like [`SurfConfig::load`], but an explicit `path` takes the place of
    /// step 2's file lookup.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from))
            .or_else(|| {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            });

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => {
                logging::debug(Source::Config, None, "no config file, using built-in defaults");
                Self::default()
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml_str(&text).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: Some(path.to_path_buf()),
                message,
            },
            other => other,
        })?;
        logging::info(
            Source::Config,
            Some(&config.beach),
            &format!("loaded config from {}", path.display()),
        );
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: None,
            message: e.to_string(),
        })
    }

    /// Applies `TARGET_BEACH` / `SURF_FORECAST_URL` from `lookup`. Empty
    /// values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(beach) = non_empty(BEACH_ENV) {
            self.beach = beach.trim().to_string();
        }
        if let Some(url) = non_empty(BASE_URL_ENV) {
            self.base_url = url.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.beach.trim().is_empty() {
            return Err(ConfigError::Missing("beach"));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("base_url"));
        }
        Ok(())
    }

    pub fn profiles(&self) -> Profiles {
        Profiles {
            good: self.good.clone(),
            perfect: self.perfect.clone(),
        }
    }

    pub fn request_timeout(&self) -> Option<std::time::Duration> {
        (self.request_timeout_secs > 0)
            .then(|| std::time::Duration::from_secs(self.request_timeout_secs))
    }

    /// Unrecognized level names fall back to `Info`.
    pub fn log_level(&self) -> LogLevel {
        LogLevel::parse(&self.log_level).unwrap_or(LogLevel::Info)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compass::CompassDirection;

    #[test]
    fn test_defaults_are_the_reference_setup() {
        let config = SurfConfig::default();
        assert_eq!(config.beach, "default-beach");
        assert_eq!(config.base_url, "https://www.surf-forecast.com");
        assert_eq!(config.profiles(), Profiles::reference());
        assert_eq!(config.good.wind_direction_tolerance(), 2);
        assert_eq!(config.perfect.wind_direction_tolerance(), 1);
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_the_rest() {
        let config = SurfConfig::from_toml_str(
            r#"
            beach = "Bells-Beach"
            request_timeout_secs = 0
            "#,
        )
        .expect("partial config should parse");
        assert_eq!(config.beach, "Bells-Beach");
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.good, CriteriaProfile::reference_good());
    }

    #[test]
    fn test_profiles_from_file() {
        let config = SurfConfig::from_toml_str(
            r#"
            beach = "Pipeline"

            [good]
            wave_height = { min = 1.5, max = 4.0 }
            wave_period = { min = 10.0, max = 20.0 }
            preferred_wave_directions = ["NW", "N"]
            max_wind_speed = 20.0
            wind_direction_tolerance = 3

            [perfect]
            wave_height = { min = 2.0, max = 3.0 }
            wave_period = { min = 14.0, max = 20.0 }
            preferred_wave_directions = ["NW"]
            max_wind_speed = 12.0
            wind_direction_tolerance = 1
            "#,
        )
        .expect("full config should parse");
        assert_eq!(config.good.wind_direction_tolerance(), 3);
        assert_eq!(
            config.perfect.preferred_wave_directions(),
            &[CompassDirection::NW]
        );
    }

    #[test]
    fn test_explicit_path_is_used_even_when_missing() {
        let missing = Path::new("/nonexistent/surfmon.toml");
        match SurfConfig::load_from(Some(missing)) {
            Err(ConfigError::Io { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected an Io error for the explicit path, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_profile_is_a_parse_error() {
        let result = SurfConfig::from_toml_str(
            r#"
            [good]
            wave_height = { min = 3.0, max = 1.0 }
            wave_period = { min = 10.0, max = 20.0 }
            preferred_wave_directions = ["NW"]
            max_wind_speed = 20.0
            wind_direction_tolerance = 3
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_env_overrides_replace_file_values() {
        let mut config = SurfConfig::default();
        config.apply_env_overrides(|key| match key {
            BEACH_ENV => Some(" Uluwatu ".to_string()),
            BASE_URL_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.beach, "Uluwatu");
        assert_eq!(config.base_url, SURF_FORECAST_BASE_URL, "empty override is ignored");
    }

    #[test]
    fn test_empty_beach_fails_validation() {
        let config = SurfConfig {
            beach: "  ".to_string(),
            ..SurfConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Missing("beach"))));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let result = SurfConfig::from_file(Path::new("/nonexistent/surfmon.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_unknown_log_level_falls_back_to_info() {
        let config = SurfConfig {
            log_level: "chatty".to_string(),
            ..SurfConfig::default()
        };
        assert_eq!(config.log_level(), LogLevel::Info);
    }
}
