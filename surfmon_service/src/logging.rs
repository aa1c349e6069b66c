/// Structured logging for the surf monitoring service
///
/// Provides context-rich logging with beach identifiers, timestamps,
/// and severity levels. Supports both console output and file-based
/// logging for scheduled runs.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::{CellParseError, FetchError};

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl LogLevel {
    /// Parses "debug", "info", "warn"/"warning" or "error". Anything else is `None`.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Log Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// The remote forecast page and everything derived from it.
    Forecast,
    Config,
    System,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Forecast => write!(f, "FCST"),
            Source::Config => write!(f, "CFG"),
            Source::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - the page legitimately has nothing for this slot
    Expected,
    /// Unexpected failure - indicates source outage or a markup change
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut global) = LOGGER.lock() {
            *global = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, source: &Source, beach: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

        let beach_part = beach.map(|b| format!(" [{}]", b)).unwrap_or_default();
        let log_entry = format!("{} {} {}{}: {}", timestamp, level, source, beach_part, message);

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info => eprintln!("   {}", message),
                LogLevel::Debug => eprintln!("   [DEBUG] {}", message),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", source, beach_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", source, beach_part, message),
                LogLevel::Info => eprintln!("   {}", message),
                LogLevel::Debug => {} // Skip debug in non-timestamp mode
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

fn emit(level: LogLevel, source: Source, beach: Option<&str>, message: &str) {
    if let Ok(global) = LOGGER.lock() {
        if let Some(logger) = global.as_ref() {
            logger.log(level, &source, beach, message);
        }
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

/// Log a general informational message
pub fn info(source: Source, beach: Option<&str>, message: &str) {
    emit(LogLevel::Info, source, beach, message);
}

/// Log a warning message
pub fn warn(source: Source, beach: Option<&str>, message: &str) {
    emit(LogLevel::Warning, source, beach, message);
}

/// Log an error message
pub fn error(source: Source, beach: Option<&str>, message: &str) {
    emit(LogLevel::Error, source, beach, message);
}

/// Log a debug message
pub fn debug(source: Source, beach: Option<&str>, message: &str) {
    emit(LogLevel::Debug, source, beach, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a failed page fetch
pub fn classify_fetch_failure(err: &FetchError) -> FailureType {
    match err {
        // Unknown beach ids come back as 404; usually a config typo
        FetchError::HttpStatus(404) => FailureType::Unexpected,
        // Throttling and upstream maintenance are routine
        FetchError::HttpStatus(429) | FetchError::HttpStatus(503) => FailureType::Expected,
        FetchError::HttpStatus(_) => FailureType::Unexpected,
        FetchError::Transport(msg) if msg.contains("timed out") => FailureType::Unknown,
        FetchError::Transport(_) | FetchError::Body(_) => FailureType::Unexpected,
    }
}

/// Classify a wave cell that could not be decoded
pub fn classify_cell_failure(err: &CellParseError) -> FailureType {
    match err {
        // Far-out periods are sometimes rendered without a wind payload
        CellParseError::MissingWindPayload => FailureType::Expected,
        // A payload that no longer decodes suggests the page format changed
        CellParseError::MalformedWindPayload(_) => FailureType::Unexpected,
        CellParseError::MissingWaveHeight => FailureType::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a page fetch failure with automatic classification
pub fn log_fetch_failure(beach: &str, err: &FetchError) {
    let failure_type = classify_fetch_failure(err);
    let message = format!("fetch failed [{}]: {}", failure_type, err);

    match failure_type {
        FailureType::Expected => warn(Source::Forecast, Some(beach), &message),
        FailureType::Unexpected => error(Source::Forecast, Some(beach), &message),
        FailureType::Unknown => warn(Source::Forecast, Some(beach), &message),
    }
}

/// Log a skipped wave cell with classification
pub fn log_cell_failure(beach: Option<&str>, index: usize, err: &CellParseError) {
    let failure_type = classify_cell_failure(err);
    let message = format!("cell {} skipped [{}]: {}", index, failure_type, err);

    match failure_type {
        FailureType::Expected => debug(Source::Forecast, beach, &message),
        FailureType::Unexpected => warn(Source::Forecast, beach, &message),
        FailureType::Unknown => warn(Source::Forecast, beach, &message),
    }
}

// ---------------------------------------------------------------------------
// Extraction Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one page extraction
pub fn log_extraction_summary(beach: Option<&str>, total: usize, parsed: usize, failed: usize) {
    let message = format!(
        "Extraction complete: {}/{} cells parsed, {} skipped",
        parsed, total, failed
    );

    if failed == 0 && total > 0 {
        info(Source::Forecast, beach, &message);
    } else if parsed == 0 {
        error(Source::Forecast, beach, &message);
    } else {
        warn(Source::Forecast, beach, &message);
    }
}
