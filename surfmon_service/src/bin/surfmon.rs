//! surfmon - check the surf forecast for the configured beach
//!
//! `check` and `replay` print the conditions snapshot as JSON on stdout.
//! Logs go to stderr (and to `log_file` if configured).

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use surfmon_service::alert::cooldown::cooldown_remaining_at;
use surfmon_service::config::{CONFIG_PATH_ENV, SurfConfig};
use surfmon_service::dev_mode::DevMode;
use surfmon_service::ingest::surf_forecast::build_client;
use surfmon_service::logging::{self, Source};
use surfmon_service::model::ConditionsSnapshot;
use surfmon_service::{scrape_surf_conditions, verify};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "surfmon")]
#[command(about = "Rates a break's six-day surf forecast against good/perfect profiles")]
#[command(version)]
struct CliArgs {
    /// Config file (default: ./surfmon.toml if present)
    #[arg(long, global = true, value_name = "FILE", env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    /// Break identifier, overriding the configured beach
    #[arg(long, global = true, value_name = "ID")]
    beach: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and rate the forecast, printing the snapshot as JSON
    Check {
        /// Time of the previous check; skipped while the cooldown runs
        #[arg(long, value_name = "RFC3339", value_parser = parse_timestamp)]
        last_check: Option<DateTime<Utc>>,
    },
    /// Check the forecast page still carries the markers the extractor needs
    Verify,
    /// Rate a saved forecast page instead of fetching one
    Replay {
        /// Page saved from the six_day forecast
        page: PathBuf,
    },
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

// ============================================================================
// Commands
// ============================================================================

fn print_snapshot(snapshot: &ConditionsSnapshot) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(snapshot)?);
    Ok(())
}

fn run(args: CliArgs) -> Result<(), Box<dyn Error>> {
    let mut config = SurfConfig::load_from(args.config.as_deref())?;
    if let Some(beach) = args.beach {
        config.beach = beach;
    }
    logging::init_logger(config.log_level(), config.log_file.as_deref(), false);

    match args.command {
        Command::Check { last_check } => {
            let remaining =
                cooldown_remaining_at(last_check, config.check_cooldown_minutes, Utc::now());
            if remaining > 0 {
                logging::info(
                    Source::System,
                    Some(&config.beach),
                    &format!("last check too recent, wait {} more minute(s)", remaining),
                );
                return Ok(());
            }

            let client = build_client(&config.user_agent, config.request_timeout())?;
            let snapshot = scrape_surf_conditions(&client, &config)?;
            print_snapshot(&snapshot)?;

            for (day, period, slot) in snapshot.favorable_slots() {
                let tier = if slot.is_perfect { "PERFECT" } else { "good" };
                logging::info(
                    Source::Forecast,
                    Some(&config.beach),
                    &format!("{} {} {} ({})", tier, day, period, slot.formatted_date),
                );
            }
        }
        Command::Verify => {
            let client = build_client(&config.user_agent, config.request_timeout())?;
            let report = verify::verify_beach(&client, &config.base_url, &config.beach);
            verify::print_summary(&report);
            if report.status == verify::VerificationStatus::Failed {
                return Err("source verification failed".into());
            }
        }
        Command::Replay { page } => {
            let snapshot = DevMode::new(page).replay(&config.beach, &config.profiles())?;
            print_snapshot(&snapshot)?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("surfmon: {}", e);
            ExitCode::FAILURE
        }
    }
}
