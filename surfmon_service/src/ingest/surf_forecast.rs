/// Surf forecast page client and markup extractor
///
/// Retrieves the six-day forecast page for a break from the surf forecast
/// site and pulls out the per-period wave cells and the page-level scalars
/// (star rating, water temperature).
///
/// Page: {base_url}/breaks/{beach_id}/forecasts/latest/six_day
///
/// The page is HTML meant for browsers, not an API. Extraction keys off a
/// handful of structural markers:
///   - wave cells: class `forecast-table-wave-height__cell`, carrying a
///     `data-wind` JSON attribute and optionally `data-swell-state`
///   - inside each cell: `swell-icon__val` (height) and `swell-icon__letters`
///   - the period row: `data-row-name="periods"`, one `forecast-table__cell`
///     per wave cell with the period in `<strong>`
///
/// When the site changes its markup these markers stop matching and the
/// damage shows up as skipped cells, never as a failed call.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::logging::{self, Source};
use crate::model::{CellParseError, FetchError, MAX_FORECAST_CELLS, RATING_UNAVAILABLE};

pub const SURF_FORECAST_BASE_URL: &str = "https://www.surf-forecast.com";

/// The site serves a reduced page to unknown clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const WAVE_CELL_CLASS: &str = "forecast-table-wave-height__cell";
const TABLE_CELL_CLASS: &str = "forecast-table__cell";
const SWELL_VALUE_CLASS: &str = "swell-icon__val";
const SWELL_LETTERS_CLASS: &str = "swell-icon__letters";

// ============================================================================
// Page Payload Structures
// ============================================================================

/// Decoded `data-wind` attribute of a wave cell.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WindPayload {
    /// km/h
    pub speed: f64,
    #[serde(default)]
    pub direction: Option<WindPayloadDirection>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WindPayloadDirection {
    #[serde(default)]
    pub letters: Option<String>,
}

impl WindPayload {
    /// Direction letters, if the payload carried any.
    pub fn letters(&self) -> Option<&str> {
        self.direction.as_ref()?.letters.as_deref()
    }
}

/// One entry of the `data-swell-state` attribute. The page emits `null` for
/// swell trains that are absent in a period.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SwellComponent {
    pub height: f64,
    #[serde(default)]
    pub period: Option<f64>,
    #[serde(default)]
    pub letters: Option<String>,
}

// ============================================================================
// Extractor Output
// ============================================================================

/// Values read from one wave cell, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCell {
    /// Position in page order, 0-based.
    pub index: usize,
    /// Meters.
    pub wave_height: f64,
    /// Seconds; 0 when the period row had nothing for this index.
    pub wave_period: f64,
    /// As printed, e.g. "SW". Empty when missing.
    pub swell_letters: String,
    pub wind: WindPayload,
}

/// Everything the extractor could read from one page.
#[derive(Debug, Clone, PartialEq)]
pub struct RawForecast {
    /// Successfully decoded cells, in ascending index order.
    pub cells: Vec<RawCell>,
    /// Cells that were present but could not be decoded.
    pub skipped: Vec<(usize, CellParseError)>,
    /// Wave cells found on the page, including any past the 21-cell limit.
    pub cells_found: usize,
    /// Entries found in the period row.
    pub period_values_found: usize,
    /// "N stars" or "N/A".
    pub rating: String,
    /// °C. `None` when the page did not state it.
    pub temperature: Option<f64>,
}

impl Default for RawForecast {
    fn default() -> Self {
        Self {
            cells: Vec::new(),
            skipped: Vec::new(),
            cells_found: 0,
            period_values_found: 0,
            rating: RATING_UNAVAILABLE.to_string(),
            temperature: None,
        }
    }
}

// ============================================================================
// Client Functions
// ============================================================================

/// Builds the six-day forecast URL for a break.
pub fn build_forecast_url(base_url: &str, beach_id: &str) -> String {
    format!(
        "{}/breaks/{}/forecasts/latest/six_day",
        base_url.trim_end_matches('/'),
        beach_id
    )
}

/// Builds a blocking client presenting a browser user agent.
///
/// `timeout` is the caller's policy; extraction itself never times out.
pub fn build_client(
    user_agent: &str,
    timeout: Option<Duration>,
) -> Result<reqwest::blocking::Client, reqwest::Error> {
    let mut builder = reqwest::blocking::Client::builder().user_agent(user_agent);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Fetch the forecast page for a break
///
/// # Returns
/// The page body. Fails only if the request cannot be completed or the
/// response status is not a success.
pub fn fetch_forecast_page(
    client: &reqwest::blocking::Client,
    base_url: &str,
    beach_id: &str,
) -> Result<String, FetchError> {
    let url = build_forecast_url(base_url, beach_id);
    logging::debug(Source::Forecast, Some(beach_id), &format!("GET {}", url));

    let response = client
        .get(&url)
        .header("Accept", "text/html")
        .send()
        .map_err(|e| FetchError::Transport(e.to_string()))?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    response.text().map_err(|e| FetchError::Body(e.to_string()))
}

/// Fetch and parse in one step.
pub fn fetch_forecast(
    client: &reqwest::blocking::Client,
    base_url: &str,
    beach_id: &str,
) -> Result<RawForecast, FetchError> {
    let html = fetch_forecast_page(client, base_url, beach_id)?;
    Ok(parse_forecast_page(&html, Some(beach_id)))
}

// ============================================================================
// Page Parsing
// ============================================================================

static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([A-Za-z][A-Za-z0-9]*)\b([^>]*)>").expect("open tag pattern")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("attribute pattern")
});

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));

static STRONG_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<strong\b[^>]*>([^<]*)").expect("strong pattern")
});

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([0-9]+(?:\.[0-9]+)?)").expect("number pattern")
});

static SEA_TEMPERATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)sea temperature is.{0,120}?([0-9]+(?:\.[0-9]+)?)\s*°\s*C")
        .expect("temperature pattern")
});

static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img\b").expect("img pattern"));

/// An opening tag found in the page.
struct Tag<'a> {
    name: &'a str,
    attrs: &'a str,
    start: usize,
    /// Offset just past the closing `>`.
    end: usize,
}

fn open_tags(html: &str) -> impl Iterator<Item = Tag<'_>> {
    OPEN_TAG.captures_iter(html).filter_map(|caps| {
        let whole = caps.get(0)?;
        Some(Tag {
            name: caps.get(1)?.as_str(),
            attrs: caps.get(2)?.as_str(),
            start: whole.start(),
            end: whole.end(),
        })
    })
}

/// Value of attribute `name` in an opening tag's attribute text, with HTML
/// entities decoded.
fn attribute(attrs: &str, name: &str) -> Option<String> {
    ATTRIBUTE.captures_iter(attrs).find_map(|caps| {
        let key = caps.get(1)?.as_str();
        if !key.eq_ignore_ascii_case(name) {
            return None;
        }
        let raw = caps.get(2).or_else(|| caps.get(3))?.as_str();
        Some(html_escape::decode_html_entities(raw).into_owned())
    })
}

fn has_class(attrs: &str, class: &str) -> bool {
    attribute(attrs, "class")
        .is_some_and(|value| value.split_ascii_whitespace().any(|c| c == class))
}

/// Splits `html` into the fragments belonging to each tag matching `pred`.
/// A fragment runs from the end of its opening tag to the start of the next
/// match or the end of the enclosing row, whichever comes first.
fn fragments<'a>(
    html: &'a str,
    pred: impl Fn(&Tag<'_>) -> bool,
) -> Vec<(Tag<'a>, &'a str)> {
    let tags: Vec<Tag<'a>> = open_tags(html).filter(|t| pred(t)).collect();
    let starts: Vec<usize> = tags.iter().map(|t| t.start).skip(1).collect();

    tags.into_iter()
        .enumerate()
        .map(|(i, tag)| {
            let limit = starts.get(i).copied().unwrap_or(html.len());
            let body = &html[tag.end..limit];
            let body = match body.find("</tr") {
                Some(row_end) => &body[..row_end],
                None => body,
            };
            (tag, body)
        })
        .collect()
}

/// Text directly following the first element carrying `class`.
fn element_text(fragment: &str, class: &str) -> Option<String> {
    let tag = open_tags(fragment).find(|t| has_class(t.attrs, class))?;
    let text = fragment[tag.end..].split('<').next().unwrap_or_default();
    let text = html_escape::decode_html_entities(text.trim()).into_owned();
    if text.is_empty() { None } else { Some(text) }
}

/// Leading decimal number of `text`, like a lenient float parse.
fn leading_number(text: &str) -> Option<f64> {
    LEADING_NUMBER
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}

/// Decodes a `data-wind` attribute value.
pub fn decode_wind_payload(json: &str) -> Result<WindPayload, CellParseError> {
    serde_json::from_str(json).map_err(|e| CellParseError::MalformedWindPayload(e.to_string()))
}

/// Decodes a `data-swell-state` attribute value. Returns `None` when the
/// value does not decode; the swell state is only ever a fallback.
pub fn decode_swell_state(json: &str) -> Option<Vec<SwellComponent>> {
    let swells: Vec<Option<SwellComponent>> = serde_json::from_str(json).ok()?;
    Some(swells.into_iter().flatten().collect())
}

/// The highest swell train; ties keep the first.
pub fn primary_swell(swells: &[SwellComponent]) -> Option<&SwellComponent> {
    swells.iter().fold(None, |best: Option<&SwellComponent>, swell| match best {
        Some(b) if b.height >= swell.height => Some(b),
        _ => Some(swell),
    })
}

/// Period values from the `periods` row, in page order. Cells without a
/// readable number contribute 0 so later indices stay aligned.
fn parse_period_row(html: &str) -> Vec<f64> {
    let Some(row) = open_tags(html).find(|t| {
        attribute(t.attrs, "data-row-name").is_some_and(|v| v == "periods")
    }) else {
        return Vec::new();
    };
    let row_body = &html[row.end..];
    let row_body = match row_body.find("</tr") {
        Some(end) => &row_body[..end],
        None => row_body,
    };

    fragments(row_body, |t| has_class(t.attrs, TABLE_CELL_CLASS))
        .into_iter()
        .map(|(_, cell)| {
            STRONG_TEXT
                .captures(cell)
                .and_then(|caps| caps.get(1))
                .and_then(|m| leading_number(m.as_str()))
                .unwrap_or(0.0)
        })
        .collect()
}

/// Number of star images in the second cell of the first body row of the
/// forecast table, as "N stars"; "N/A" when there are none.
fn parse_rating(html: &str) -> String {
    let rating = (|| {
        let table = open_tags(html).find(|t| has_class(t.attrs, "forecast-table"))?;
        let after_table = &html[table.end..];
        let tbody = open_tags(after_table).find(|t| t.name.eq_ignore_ascii_case("tbody"))?;
        let after_tbody = &after_table[tbody.end..];
        let row = open_tags(after_tbody).find(|t| t.name.eq_ignore_ascii_case("tr"))?;
        let row_body = &after_tbody[row.end..];
        let row_body = match row_body.find("</tr") {
            Some(end) => &row_body[..end],
            None => row_body,
        };
        let cells = fragments(row_body, |t| t.name.eq_ignore_ascii_case("td"));
        let (_, second) = cells.get(1)?;
        Some(IMAGE.find_iter(second).count())
    })();

    match rating {
        Some(stars) if stars > 0 => format!("{} stars", stars),
        _ => RATING_UNAVAILABLE.to_string(),
    }
}

/// Water temperature in °C from the "sea temperature is …°C" sentence.
fn parse_temperature(html: &str) -> Option<f64> {
    let text = ANY_TAG.replace_all(html, " ");
    let text = html_escape::decode_html_entities(&text);
    SEA_TEMPERATURE
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn decode_cell(
    index: usize,
    attrs: &str,
    body: &str,
    period_values: &[f64],
) -> Result<RawCell, CellParseError> {
    let swells = attribute(attrs, "data-swell-state")
        .and_then(|json| decode_swell_state(&json))
        .unwrap_or_default();
    let primary = primary_swell(&swells);

    let wave_height = element_text(body, SWELL_VALUE_CLASS)
        .and_then(|text| leading_number(&text))
        .or_else(|| primary.map(|s| s.height))
        .ok_or(CellParseError::MissingWaveHeight)?;

    let swell_letters = element_text(body, SWELL_LETTERS_CLASS)
        .or_else(|| primary.and_then(|s| s.letters.clone()))
        .unwrap_or_default();

    let wave_period = period_values
        .get(index)
        .copied()
        .filter(|p| *p > 0.0)
        .or_else(|| primary.and_then(|s| s.period))
        .unwrap_or(0.0);

    let wind_json = attribute(attrs, "data-wind").ok_or(CellParseError::MissingWindPayload)?;
    let mut wind = decode_wind_payload(&wind_json)?;
    wind.speed = non_negative(wind.speed);

    Ok(RawCell {
        index,
        wave_height: non_negative(wave_height),
        wave_period: non_negative(wave_period),
        swell_letters: swell_letters.trim().to_string(),
        wind,
    })
}

/// Parse a forecast page. Never fails: undecodable cells are logged and
/// skipped, missing scalars fall back to "N/A" and 0.
pub fn parse_forecast_page(html: &str, beach: Option<&str>) -> RawForecast {
    let period_values = parse_period_row(html);
    let wave_cells = fragments(html, |t| has_class(t.attrs, WAVE_CELL_CLASS));

    let mut forecast = RawForecast {
        cells_found: wave_cells.len(),
        period_values_found: period_values.len(),
        ..RawForecast::default()
    };

    for (index, (tag, body)) in wave_cells.iter().enumerate().take(MAX_FORECAST_CELLS) {
        match decode_cell(index, tag.attrs, body, &period_values) {
            Ok(cell) => forecast.cells.push(cell),
            Err(err) => {
                logging::log_cell_failure(beach, index, &err);
                forecast.skipped.push((index, err));
            }
        }
    }

    forecast.rating = parse_rating(html);
    forecast.temperature = parse_temperature(html).map(non_negative);
    if forecast.temperature.is_none() {
        logging::debug(Source::Forecast, beach, "sea temperature not found");
    }

    logging::log_extraction_summary(
        beach,
        wave_cells.len().min(MAX_FORECAST_CELLS),
        forecast.cells.len(),
        forecast.skipped.len(),
    );

    forecast
}

// ============================================================================
// Tests
// ============================================================================
