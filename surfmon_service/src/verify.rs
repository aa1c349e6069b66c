//! Forecast Source Verification Module
//!
//! Checks a configured beach against the live forecast site to determine
//! whether the page is reachable and still carries the markers the
//! extractor depends on. Markup drift on the site does not make checks
//! fail; it only thins out the grid. This report is how you notice.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::ingest::surf_forecast::{build_forecast_url, fetch_forecast_page, parse_forecast_page};
use crate::model::{MAX_FORECAST_CELLS, RATING_UNAVAILABLE};

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeachVerification {
    pub timestamp: String,
    pub beach: String,
    pub url: String,
    pub status: VerificationStatus,
    pub page_fetched: bool,
    /// Wave cells present on the page.
    pub cells_found: usize,
    /// Wave cells that decoded.
    pub cells_parsed: usize,
    /// Decode failures, as "index: error".
    pub cell_errors: Vec<String>,
    pub period_values_found: usize,
    pub rating_found: bool,
    pub temperature_found: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum VerificationStatus {
    /// Every expected marker is present.
    Success,
    /// Page fetched and some cells decoded, but parts are missing.
    PartialSuccess,
    Failed,
}

// ============================================================================
// Verification
// ============================================================================

/// Grades an already-fetched page.
pub fn verify_page(beach: &str, url: &str, html: &str) -> BeachVerification {
    let raw = parse_forecast_page(html, Some(beach));
    let expected_cells = raw.cells_found.min(MAX_FORECAST_CELLS);

    let mut result = BeachVerification {
        timestamp: Utc::now().to_rfc3339(),
        beach: beach.to_string(),
        url: url.to_string(),
        status: VerificationStatus::Failed,
        page_fetched: true,
        cells_found: raw.cells_found,
        cells_parsed: raw.cells.len(),
        cell_errors: raw
            .skipped
            .iter()
            .map(|(index, err)| format!("{}: {}", index, err))
            .collect(),
        period_values_found: raw.period_values_found,
        rating_found: raw.rating != RATING_UNAVAILABLE,
        temperature_found: raw.temperature.is_some(),
        error_message: None,
    };

    // Determine status
    if result.cells_parsed == 0 {
        result.error_message = Some("No wave cells could be parsed".to_string());
    } else if result.cells_parsed == MAX_FORECAST_CELLS
        && result.cells_parsed == expected_cells
        && result.period_values_found >= MAX_FORECAST_CELLS
        && result.rating_found
        && result.temperature_found
    {
        result.status = VerificationStatus::Success;
    } else {
        result.status = VerificationStatus::PartialSuccess;
    }

    result
}

/// Fetches the page for `beach` and grades it.
pub fn verify_beach(
    client: &reqwest::blocking::Client,
    base_url: &str,
    beach: &str,
) -> BeachVerification {
    let url = build_forecast_url(base_url, beach);

    match fetch_forecast_page(client, base_url, beach) {
        Ok(html) => verify_page(beach, &url, &html),
        Err(e) => BeachVerification {
            timestamp: Utc::now().to_rfc3339(),
            beach: beach.to_string(),
            url,
            status: VerificationStatus::Failed,
            page_fetched: false,
            cells_found: 0,
            cells_parsed: 0,
            cell_errors: Vec::new(),
            period_values_found: 0,
            rating_found: false,
            temperature_found: false,
            error_message: Some(format!("Request failed: {}", e)),
        },
    }
}

pub fn print_summary(report: &BeachVerification) {
    let mark = |ok: bool| if ok { "✓" } else { "✗" };

    println!("\n═══════════════════════════════════════════════════════════");
    println!("📊 SOURCE VERIFICATION: {}", report.beach);
    println!("═══════════════════════════════════════════════════════════");
    println!("URL:          {}", report.url);
    println!("Status:       {:?}", report.status);
    println!("Page fetched: {}", mark(report.page_fetched));
    println!(
        "Wave cells:   {}/{} parsed ({} on page)",
        report.cells_parsed, MAX_FORECAST_CELLS, report.cells_found
    );
    println!("Periods row:  {} values", report.period_values_found);
    println!("Rating:       {}", mark(report.rating_found));
    println!("Temperature:  {}", mark(report.temperature_found));

    if !report.cell_errors.is_empty() {
        println!("\n⚠ Skipped cells ({}):", report.cell_errors.len());
        for err in &report.cell_errors {
            println!("   - {}", err);
        }
    }
    if let Some(err) = &report.error_message {
        println!("\n✗ {}", err);
    }
    println!("═══════════════════════════════════════════════════════════");
}
