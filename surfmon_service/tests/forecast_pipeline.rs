/// Integration tests for the page → grid → snapshot pipeline
///
/// These tests verify:
/// 1. A saved forecast page decodes into cells, skipping the broken ones
/// 2. Decoded cells land on the right day/period slots with verdicts
/// 3. The snapshot's flat fields, rating and temperature come through
/// 4. The serialized snapshot has the shape consumers read
/// 5. A failed fetch (bad status, refused connection) surfaces as ScrapeError
///
/// Fetch tests run against a one-shot server on 127.0.0.1. The live-site test at the bottom is ignored by default. Run it with:
///   cargo test --test forecast_pipeline -- --ignored
///
/// Note: the live test makes a real request and may fail if the site is
/// down, rate-limiting, or has changed its markup.

use std::error::Error;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use surfmon_service::alert::criteria::Profiles;
use surfmon_service::compass::CompassDirection;
use surfmon_service::ingest::surf_forecast::{
    BROWSER_USER_AGENT, SURF_FORECAST_BASE_URL, build_client, parse_forecast_page,
};
use surfmon_service::model::{CellParseError, FORECAST_DAYS, FetchError, PeriodOfDay};
use surfmon_service::{assemble_snapshot, scrape_beach};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn wind_attr(json: &str) -> String {
    format!(r#" data-wind="{}""#, html_escape::encode_double_quoted_attribute(json))
}

fn wave_cell(extra_attrs: &str, height: &str, letters: &str) -> String {
    format!(
        r#"<td class="forecast-table__cell forecast-table-wave-height__cell"{}><div class="swell-icon"><span class="swell-icon__val">{}</span><span class="swell-icon__letters">{}</span></div></td>"#,
        extra_attrs, height, letters
    )
}

fn period_cell(value: &str) -> String {
    format!(r#"<td class="forecast-table__cell"><strong>{}</strong></td>"#, value)
}

/// Five wave cells: a perfect morning, a blown-out afternoon, a cell with
/// no wind payload, a cell that only carries its swell state, and a cell
/// with a corrupt wind payload.
fn sample_page() -> String {
    let swell_state = html_escape::encode_double_quoted_attribute(
        r#"[null, {"height": 1.6, "period": 14, "letters": "W"}]"#,
    )
    .into_owned();

    let periods: String = ["16", "9", "12", "-", "11"].iter().map(|p| period_cell(p)).collect();
    let waves = [
        wave_cell(&wind_attr(r#"{"speed": 8, "direction": {"letters": "N"}}"#), "1.2", "S"),
        wave_cell(&wind_attr(r#"{"speed": 30, "direction": {"letters": "E"}}"#), "2.5", "E"),
        wave_cell("", "1.4", "SW"),
        format!(
            r#"<td class="forecast-table__cell forecast-table-wave-height__cell"{} data-swell-state="{}"></td>"#,
            wind_attr(r#"{"speed": 10, "direction": {"letters": "E"}}"#),
            swell_state
        ),
        wave_cell(&wind_attr(r#"{"speed": "#), "1.1", "S"),
    ]
    .concat();

    format!(
        r#"<html><body>
        <p>The sea temperature is 18&deg;C today.</p>
        <table class="forecast-table"><tbody>
        <tr class="forecast-table__row"><td>Rating</td><td><img src="star.png"><img src="star.png"><img src="star.png"></td></tr>
        <tr class="forecast-table__row" data-row-name="periods">{}</tr>
        <tr class="forecast-table__row" data-row-name="wave-height">{}</tr>
        </tbody></table>
        </body></html>"#,
        periods, waves
    )
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
}

/// Answers exactly one request with `status_line` and `body`, returning the
/// base URL to point the client at.
fn serve_once(status_line: &'static str, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind local listener");
    let addr = listener.local_addr().expect("listener has an address");

    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        let _ = stream.write_all(response.as_bytes());
    });

    format!("http://{}", addr)
}

fn local_client() -> reqwest::blocking::Client {
    build_client(BROWSER_USER_AGENT, Some(Duration::from_secs(10)))
        .expect("Failed to build HTTP client")
}

// ---------------------------------------------------------------------------
// Offline Pipeline Tests
// ---------------------------------------------------------------------------

#[test]
fn test_sample_page_extraction_counts() {
    let raw = parse_forecast_page(&sample_page(), Some("Test-Beach"));

    assert_eq!(raw.cells_found, 5, "every wave cell should be counted");
    assert_eq!(raw.cells.len(), 3, "three cells decode");
    assert_eq!(raw.period_values_found, 5);

    let skipped: Vec<usize> = raw.skipped.iter().map(|(i, _)| *i).collect();
    assert_eq!(skipped, vec![2, 4]);
    assert!(matches!(raw.skipped[0].1, CellParseError::MissingWindPayload));
    assert!(matches!(raw.skipped[1].1, CellParseError::MalformedWindPayload(_)));

    assert_eq!(raw.rating, "3 stars");
    assert_eq!(raw.temperature, Some(18.0));
}

#[test]
fn test_swell_state_fills_in_a_bare_cell() {
    let raw = parse_forecast_page(&sample_page(), None);
    let cell = raw.cells.iter().find(|c| c.index == 3).expect("cell 3 decodes");

    assert_eq!(cell.wave_height, 1.6);
    assert_eq!(cell.swell_letters, "W");
    assert_eq!(cell.wave_period, 14.0, "unreadable period falls back to the swell period");
}

#[test]
fn test_sample_page_grid_and_verdicts() {
    let raw = parse_forecast_page(&sample_page(), Some("Test-Beach"));
    let snap = assemble_snapshot(&raw, &Profiles::reference(), fixed_now(), &Utc);
    let forecast = &snap.detailed_forecast;

    let today = forecast.day_by_key("today").expect("today present");
    let morning = today.morning.as_ref().expect("cell 0 is today's morning");
    assert!(morning.is_good && morning.is_perfect);
    assert_eq!(morning.formatted_date, "Wed, May 1");

    let afternoon = today.afternoon.as_ref().expect("cell 1 is today's afternoon");
    assert!(!afternoon.is_good && !afternoon.is_perfect);

    assert!(today.night.is_none(), "cell 2 was skipped");

    let day2 = forecast.day_by_key("day2").expect("day2 present");
    let day2_morning = day2.morning.as_ref().expect("cell 3 is day2's morning");
    assert_eq!(day2_morning.wave.direction, CompassDirection::W);
    assert!(day2_morning.is_good, "W swell under E wind at 14 s is good");
    assert!(!day2_morning.is_perfect);
    assert_eq!(day2_morning.formatted_date, "Thu, May 2");
    assert!(day2.afternoon.is_none(), "cell 4 was skipped");

    assert_eq!(forecast.iter().count(), FORECAST_DAYS);
    assert_eq!(forecast.populated_slots(), 3);
}

#[test]
fn test_sample_page_snapshot_fields() {
    let raw = parse_forecast_page(&sample_page(), Some("Test-Beach"));
    let snap = assemble_snapshot(&raw, &Profiles::reference(), fixed_now(), &Utc);

    assert_eq!(snap.wave_height, 1.2);
    assert_eq!(snap.wave_period, 16.0);
    assert_eq!(snap.wave_direction, CompassDirection::S);
    assert_eq!(snap.wind_speed, 8.0);
    assert_eq!(snap.wind_direction, CompassDirection::N);
    assert!(snap.is_good && snap.is_perfect);
    assert_eq!(snap.rating, "3 stars");
    assert_eq!(snap.temperature, 18.0);

    let favorable: Vec<(String, PeriodOfDay)> = snap
        .favorable_slots()
        .into_iter()
        .map(|(day, period, _)| (day, period))
        .collect();
    assert_eq!(
        favorable,
        vec![
            ("today".to_string(), PeriodOfDay::Morning),
            ("day2".to_string(), PeriodOfDay::Morning),
        ]
    );
}

#[test]
fn test_sample_page_json_shape() {
    let raw = parse_forecast_page(&sample_page(), None);
    let snap = assemble_snapshot(&raw, &Profiles::reference(), fixed_now(), &Utc);
    let json = serde_json::to_value(&snap).expect("snapshot serializes");

    assert_eq!(json["waveDirection"], "S");
    assert_eq!(json["rating"], "3 stars");

    let days = json["detailedForecast"].as_object().expect("forecast is a map");
    assert_eq!(days.len(), FORECAST_DAYS);
    for key in ["today", "day2", "day3", "day4", "day5", "day6", "day7"] {
        let day = days.get(key).unwrap_or_else(|| panic!("missing day '{}'", key));
        for period in ["morning", "afternoon", "night"] {
            assert!(day.get(period).is_some(), "{}.{} must be present, even as null", key, period);
        }
    }
    assert!(json["detailedForecast"]["today"]["night"].is_null());
    assert_eq!(json["detailedForecast"]["day2"]["morning"]["wave"]["direction"], "W");
    assert!(json["detailedForecast"]["day7"]["night"].is_null());
}

#[test]
fn test_unrecognizable_page_yields_neutral_snapshot() {
    let raw = parse_forecast_page("<html><body>Under maintenance</body></html>", None);
    let snap = assemble_snapshot(&raw, &Profiles::reference(), fixed_now(), &Utc);

    assert_eq!(snap.detailed_forecast.populated_slots(), 0);
    assert_eq!(snap.rating, "N/A");
    assert_eq!(snap.temperature, 0.0);
    assert_eq!(snap.wave_direction, CompassDirection::Unknown);
    assert!(!snap.is_good && !snap.is_perfect);
}

// ---------------------------------------------------------------------------
// Fetch Tests (local server)
// ---------------------------------------------------------------------------

#[test]
fn test_served_page_scrapes_into_snapshot() {
    let base_url = serve_once("200 OK", sample_page());

    let snap = scrape_beach(&local_client(), &base_url, "Test-Beach", &Profiles::reference())
        .expect("a 200 page should scrape");

    assert_eq!(snap.detailed_forecast.populated_slots(), 3);
    assert_eq!(snap.rating, "3 stars");
    assert!(snap.is_perfect);
}

#[test]
fn test_http_503_becomes_scrape_error() {
    let base_url = serve_once("503 Service Unavailable", String::new());

    let err = scrape_beach(&local_client(), &base_url, "Test-Beach", &Profiles::reference())
        .expect_err("a 503 must fail the scrape");

    assert_eq!(err.beach, "Test-Beach");
    assert_eq!(err.cause, FetchError::HttpStatus(503));
    assert!(err.source().is_some(), "the fetch error should be the source");
    assert_eq!(
        err.to_string(),
        "Failed to scrape surf conditions for Test-Beach: HTTP error: 503"
    );
}

#[test]
fn test_refused_connection_becomes_transport_error() {
    // Nothing listens on port 1.
    let err = scrape_beach(&local_client(), "http://127.0.0.1:1", "Test-Beach", &Profiles::reference())
        .expect_err("a refused connection must fail the scrape");

    assert!(
        matches!(err.cause, FetchError::Transport(_)),
        "expected a transport error, got {:?}",
        err.cause
    );
    assert!(err.source().is_some(), "the fetch error should be the source");
}

// ---------------------------------------------------------------------------
// Live Site Test
// ---------------------------------------------------------------------------

#[test]
#[ignore]
fn test_live_site_returns_forecast_for_bells_beach() {
    let client = build_client(BROWSER_USER_AGENT, Some(Duration::from_secs(30)))
        .expect("Failed to build HTTP client");

    let snap = scrape_beach(&client, SURF_FORECAST_BASE_URL, "Bells-Beach", &Profiles::reference())
        .unwrap_or_else(|e| panic!("live scrape failed: {}", e));

    println!("✓ Bells-Beach: {} slots populated", snap.detailed_forecast.populated_slots());
    println!("  rating {}, sea {}°C", snap.rating, snap.temperature);

    assert!(
        snap.detailed_forecast.populated_slots() > 0,
        "live page produced no slots; the markup may have changed"
    );
}
