use std::env;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::country::{CountryCode, parse_code_list};
use crate::http_client::http_client;
use crate::state::CompetitionRecord;

const WCA_COMPETITIONS_URL: &str = "https://www.worldcubeassociation.org/api/v0/competitions";
const DEFAULT_MAX_PAGES: u32 = 1;

#[derive(Debug, Clone)]
pub struct WcaFetchConfig {
    pub base_url: String,
    pub countries: Vec<CountryCode>,
    pub max_pages: u32,
    /// Tokens from `WCA_COUNTRIES` that are not supported codes.
    pub rejected_countries: Vec<String>,
}

impl Default for WcaFetchConfig {
    fn default() -> Self {
        Self {
            base_url: WCA_COMPETITIONS_URL.to_string(),
            countries: CountryCode::ALL.to_vec(),
            max_pages: DEFAULT_MAX_PAGES,
            rejected_countries: Vec::new(),
        }
    }
}

impl WcaFetchConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(base) = env::var("WCA_API_BASE") {
            let base = base.trim().trim_end_matches('/');
            if !base.is_empty() {
                cfg.base_url = base.to_string();
            }
        }
        if let Ok(raw) = env::var("WCA_COUNTRIES") {
            let (codes, rejected) = parse_code_list(&raw);
            if !codes.is_empty() {
                cfg.countries = codes;
            }
            cfg.rejected_countries = rejected;
        }
        cfg.max_pages = env::var("WCA_MAX_PAGES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_PAGES)
            .clamp(1, 10);
        cfg
    }
}

/// One retrieval per country: every record in `country` starting on or after
/// `from`.
pub trait CompetitionSource: Send + Sync {
    fn fetch_country(
        &self,
        country: CountryCode,
        from: NaiveDate,
    ) -> Result<Vec<CompetitionRecord>>;
}

pub struct WcaSource {
    cfg: WcaFetchConfig,
}

impl WcaSource {
    pub fn new(cfg: WcaFetchConfig) -> Self {
        Self { cfg }
    }
}

impl CompetitionSource for WcaSource {
    fn fetch_country(
        &self,
        country: CountryCode,
        from: NaiveDate,
    ) -> Result<Vec<CompetitionRecord>> {
        let client = http_client()?;
        let mut all = Vec::new();

        for page in 1..=self.cfg.max_pages {
            let url = competitions_url(&self.cfg.base_url, country, from, page);
            let resp = client
                .get(&url)
                .header(ACCEPT, "application/json")
                .send()
                .with_context(|| format!("request failed for {country}"))?;
            let status = resp.status();
            let body = resp.text().context("failed reading body")?;
            if !status.is_success() {
                return Err(anyhow::anyhow!("http {} for {}", status, country));
            }
            let rows = parse_competitions_json(&body)
                .with_context(|| format!("invalid competitions json for {country}"))?;
            if rows.is_empty() {
                break;
            }
            all.extend(rows);
        }

        Ok(all)
    }
}

pub fn competitions_url(base: &str, country: CountryCode, from: NaiveDate, page: u32) -> String {
    let mut url = format!(
        "{base}?country_iso2={country}&start={}&sort=start_date",
        from.format("%Y-%m-%d")
    );
    if page > 1 {
        url.push_str(&format!("&page={page}"));
    }
    url
}

#[derive(Debug, Deserialize)]
struct WcaCompetition {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    country_iso2: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    event_ids: Option<Vec<String>>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    website: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    venue_address: Option<String>,
    #[serde(default)]
    venue_details: Option<String>,
    #[serde(default)]
    latitude_degrees: Option<f64>,
    #[serde(default)]
    longitude_degrees: Option<f64>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

/// Parses a competitions response body.
///
/// Rows without an id or with a null or unparsable start date are skipped;
/// an end date before the start (or missing) collapses to the start date.
/// Other null fields read as empty.
pub fn parse_competitions_json(raw: &str) -> Result<Vec<CompetitionRecord>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let rows: Vec<WcaCompetition> = serde_json::from_str(trimmed).context("invalid wca json")?;
    Ok(rows.into_iter().filter_map(into_record).collect())
}

fn into_record(row: WcaCompetition) -> Option<CompetitionRecord> {
    let id = row.id.and_then(non_empty)?;
    let start_date = row.start_date.as_deref().and_then(parse_date)?;
    let end_date = row
        .end_date
        .as_deref()
        .and_then(parse_date)
        .filter(|end| *end >= start_date)
        .unwrap_or(start_date);

    Some(CompetitionRecord {
        id,
        name: trimmed_or_empty(row.name),
        city: trimmed_or_empty(row.city),
        country_code: trimmed_or_empty(row.country_iso2).to_ascii_uppercase(),
        start_date,
        end_date,
        event_ids: row.event_ids.unwrap_or_default(),
        detail_url: row.url.unwrap_or_default(),
        website_url: row.website.unwrap_or_default(),
        short_name: row.short_name.and_then(non_empty),
        venue_address: row.venue_address.and_then(non_empty),
        venue_details: row.venue_details.and_then(non_empty),
        latitude: row.latitude_degrees.or(row.latitude),
        longitude: row.longitude_degrees.or(row.longitude),
    })
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn trimmed_or_empty(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
