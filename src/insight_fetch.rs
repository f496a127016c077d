use std::env;

use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use crate::country::CountryCatalog;
use crate::http_client::http_client;
use crate::state::CompetitionRecord;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Only the head of the sorted listing goes into the summary prompt.
pub const SUMMARY_RECORD_LIMIT: usize = 30;

pub const GUIDE_EMPTY_FALLBACK: &str = "Sorry, I couldn't generate a travel guide at this moment.";
pub const GUIDE_ERROR_FALLBACK: &str =
    "Unable to load AI travel insights. Please check your API configuration.";

#[derive(Debug, Clone)]
pub struct InsightConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl InsightConfig {
    pub fn from_env() -> Self {
        let enabled = env::var("INSIGHTS_ENABLED")
            .ok()
            .map(|v| {
                !matches!(
                    v.trim().to_ascii_lowercase().as_str(),
                    "0" | "false" | "no" | "off"
                )
            })
            .unwrap_or(true);
        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let model = env::var("GEMINI_MODEL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = env::var("GEMINI_API_BASE")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| GEMINI_BASE_URL.to_string());

        Self {
            enabled,
            api_key,
            model,
            base_url,
        }
    }
}

/// A generative-text backend: prompt in, free text out.
pub trait InsightClient: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightKind {
    Summary,
    Guide,
}

/// What came back from one insight request.
///
/// Kept structured up to the presentation boundary; `display_text` is the
/// only place that collapses it to a plain string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightOutcome {
    Generated(String),
    EmptyResponse,
    NotRequested,
    Failed(String),
}

impl InsightOutcome {
    pub fn from_response(res: Result<String>) -> Self {
        match res {
            Ok(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    InsightOutcome::EmptyResponse
                } else {
                    InsightOutcome::Generated(trimmed.to_string())
                }
            }
            Err(err) => InsightOutcome::Failed(format!("{err:#}")),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, InsightOutcome::Failed(_))
    }

    pub fn display_text(&self, kind: InsightKind) -> String {
        match (self, kind) {
            (InsightOutcome::Generated(text), _) => text.clone(),
            (InsightOutcome::NotRequested, _) => String::new(),
            (InsightOutcome::EmptyResponse, InsightKind::Summary)
            | (InsightOutcome::Failed(_), InsightKind::Summary) => String::new(),
            (InsightOutcome::EmptyResponse, InsightKind::Guide) => GUIDE_EMPTY_FALLBACK.to_string(),
            (InsightOutcome::Failed(_), InsightKind::Guide) => GUIDE_ERROR_FALLBACK.to_string(),
        }
    }
}

pub fn summary_prompt(records: &[CompetitionRecord]) -> Option<String> {
    if records.is_empty() {
        return None;
    }
    let lines = records
        .iter()
        .take(SUMMARY_RECORD_LIMIT)
        .map(|r| {
            format!(
                "{} in {} ({}) on {}",
                r.name,
                r.city,
                r.country_code,
                r.start_date.format("%Y-%m-%d")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    Some(format!(
        "Analyze this list of upcoming speedcubing competitions in Asia:\n\
         {lines}\n\n\
         Provide a 2-sentence summary highlighting which country seems to be the busiest \
         for upcoming events and if there are any notable trends in dates (e.g. many in summer)."
    ))
}

pub fn guide_prompt(record: &CompetitionRecord, catalog: &CountryCatalog) -> String {
    let country = catalog.name(&record.country_code);
    format!(
        "I am a speedcuber planning to attend a WCA competition called \"{name}\" \
         in {city}, {country}.\n\
         The competition is from {start} to {end}.\n\n\
         Please provide a concise travel guide (max 200 words) formatted in Markdown.\n\
         Include:\n\
         1. A fun fact about the city.\n\
         2. Weather expectations for that time of year.\n\
         3. One \"Must-Eat\" local food recommendation.\n\
         4. A quick tip for getting around.\n\n\
         Keep the tone excited and helpful for a traveler.",
        name = record.name,
        city = record.city,
        start = record.start_date.format("%Y-%m-%d"),
        end = record.end_date.format("%Y-%m-%d"),
    )
}

/// Empty record set short-circuits: no request goes out.
pub fn request_summary(
    client: &dyn InsightClient,
    records: &[CompetitionRecord],
) -> InsightOutcome {
    let Some(prompt) = summary_prompt(records) else {
        return InsightOutcome::NotRequested;
    };
    InsightOutcome::from_response(client.generate(&prompt))
}

pub fn request_guide(
    client: &dyn InsightClient,
    record: &CompetitionRecord,
    catalog: &CountryCatalog,
) -> InsightOutcome {
    let prompt = guide_prompt(record, catalog);
    InsightOutcome::from_response(client.generate(&prompt))
}

pub struct GeminiClient {
    cfg: InsightConfig,
}

impl GeminiClient {
    pub fn new(cfg: InsightConfig) -> Self {
        Self { cfg }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.cfg.base_url, self.cfg.model)
    }
}

impl InsightClient for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String> {
        if !self.cfg.enabled {
            return Err(anyhow::anyhow!("insights disabled"));
        }
        let Some(api_key) = self.cfg.api_key.as_deref() else {
            return Err(anyhow::anyhow!("missing GEMINI_API_KEY"));
        };

        let client = http_client()?;
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
        };
        let resp = client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .context("gemini request failed")?;
        let status = resp.status();
        let raw = resp.text().context("failed reading gemini body")?;
        if !status.is_success() {
            return Err(anyhow::anyhow!("gemini http {}: {}", status, truncate(&raw, 200)));
        }
        parse_generate_response_json(&raw)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Concatenates the text parts of the first candidate; no candidates is an
/// empty string, not an error.
pub fn parse_generate_response_json(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(String::new());
    }
    let resp: GenerateResponse = serde_json::from_str(trimmed).context("invalid gemini json")?;
    let text = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    Ok(text)
}

fn truncate(raw: &str, max: usize) -> String {
    if raw.chars().count() <= max {
        return raw.to_string();
    }
    raw.chars().take(max).collect::<String>() + "..."
}
