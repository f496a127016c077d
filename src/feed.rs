use std::env;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::country::{CountryCatalog, CountryCode};
use crate::demo_feed::{CannedInsights, DemoSource};
use crate::insight_fetch::{self, GeminiClient, InsightClient, InsightConfig, InsightOutcome};
use crate::orchestrator::{self, FetchReport};
use crate::state::{CompetitionRecord, Delta, ProviderCommand};
use crate::wca_fetch::{CompetitionSource, WcaFetchConfig, WcaSource};

const MIN_REFRESH_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Wca,
    Demo,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub source: SourceKind,
    pub wca: WcaFetchConfig,
    pub insights: InsightConfig,
    pub parallelism: usize,
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        let source = match env::var("COMPETITIONS_SOURCE")
            .unwrap_or_else(|_| "wca".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "demo" | "fake" | "offline" => SourceKind::Demo,
            _ => SourceKind::Wca,
        };
        Self {
            source,
            wca: WcaFetchConfig::from_env(),
            insights: InsightConfig::from_env(),
            parallelism: orchestrator::fetch_parallelism(),
        }
    }

    pub fn countries(&self) -> Vec<CountryCode> {
        self.wca.countries.clone()
    }

    pub fn build_source(&self) -> Arc<dyn CompetitionSource> {
        match self.source {
            SourceKind::Wca => Arc::new(WcaSource::new(self.wca.clone())),
            SourceKind::Demo => Arc::new(DemoSource::from_env()),
        }
    }

    /// Demo mode without a key answers from canned text.
    pub fn build_insights(&self) -> Arc<dyn InsightClient> {
        if self.source == SourceKind::Demo && self.insights.api_key.is_none() {
            Arc::new(CannedInsights)
        } else {
            Arc::new(GeminiClient::new(self.insights.clone()))
        }
    }
}

struct Provider {
    tx: Sender<Delta>,
    catalog: Arc<CountryCatalog>,
    countries: Vec<CountryCode>,
    source: Arc<dyn CompetitionSource>,
    insights: Arc<dyn InsightClient>,
    pool: Option<Arc<rayon::ThreadPool>>,
    last_load: Option<Instant>,
    generation: u64,
}

pub fn spawn_provider(
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
    catalog: Arc<CountryCatalog>,
    cfg: ProviderConfig,
) {
    thread::spawn(move || {
        for rejected in &cfg.wca.rejected_countries {
            let _ = tx.send(Delta::Log(format!(
                "[WARN] Ignoring unsupported country code {rejected}"
            )));
        }
        if cfg.source == SourceKind::Demo {
            let _ = tx.send(Delta::Log("[INFO] Using demo competition source".to_string()));
        }

        let mut provider = Provider {
            tx: tx.clone(),
            catalog,
            countries: cfg.countries(),
            source: cfg.build_source(),
            insights: cfg.build_insights(),
            pool: orchestrator::build_fetch_pool(cfg.parallelism).map(Arc::new),
            last_load: None,
            generation: 0,
        };

        provider.load();

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                ProviderCommand::Refresh => {
                    let min = Duration::from_secs(MIN_REFRESH_SECS);
                    if provider.last_load.is_some_and(|t| t.elapsed() < min) {
                        let _ = tx.send(Delta::Log(
                            "[INFO] Refresh skipped (too soon)".to_string(),
                        ));
                        continue;
                    }
                    provider.load();
                }
                ProviderCommand::FetchGuide(record) => provider.request_guide(record),
            }
        }
    });
}

impl Provider {
    fn load(&mut self) {
        self.generation += 1;
        let _ = self.tx.send(Delta::LoadStarted);
        let today = Utc::now().date_naive();
        let report = orchestrator::fetch_upcoming(
            self.source.as_ref(),
            &self.countries,
            today,
            self.pool.as_deref(),
        );
        self.last_load = Some(Instant::now());
        self.log_report(&report);

        let records = report.records.clone();
        let _ = self.tx.send(Delta::SetCompetitions {
            generation: self.generation,
            failed_countries: report.failed_codes(),
            reference_date: report.reference_date,
            records: report.records,
        });

        self.request_summary(records);
    }

    fn log_report(&self, report: &FetchReport) {
        for (code, reason) in &report.failures {
            let _ = self.tx.send(Delta::Log(format!(
                "[WARN] Fetch failed for {} ({}): {reason}",
                code,
                self.catalog.name(code.as_str())
            )));
        }
        if report.duplicates_dropped > 0 || report.stale_dropped > 0 {
            let _ = self.tx.send(Delta::Log(format!(
                "[INFO] Dropped {} duplicate and {} past competitions",
                report.duplicates_dropped, report.stale_dropped
            )));
        }
        let ok = self.countries.len().saturating_sub(report.failures.len());
        let _ = self.tx.send(Delta::Log(format!(
            "[INFO] Loaded {} competitions from {}/{} countries",
            report.records.len(),
            ok,
            self.countries.len()
        )));
    }

    /// Runs off the provider thread so a slow service never delays listings.
    fn request_summary(&self, records: Vec<CompetitionRecord>) {
        let tx = self.tx.clone();
        let insights = self.insights.clone();
        let generation = self.generation;
        self.spawn(move || {
            let outcome = insight_fetch::request_summary(insights.as_ref(), &records);
            if let InsightOutcome::Failed(reason) = &outcome {
                let _ = tx.send(Delta::Log(format!("[WARN] Summary request failed: {reason}")));
            }
            let _ = tx.send(Delta::SetSummary {
                generation,
                outcome,
            });
        });
    }

    fn request_guide(&self, record: CompetitionRecord) {
        let tx = self.tx.clone();
        let insights = self.insights.clone();
        let catalog = self.catalog.clone();
        self.spawn(move || {
            let outcome = insight_fetch::request_guide(insights.as_ref(), &record, &catalog);
            if let InsightOutcome::Failed(reason) = &outcome {
                let _ = tx.send(Delta::Log(format!(
                    "[WARN] Guide request failed for {}: {reason}",
                    record.id
                )));
            }
            let _ = tx.send(Delta::SetGuide {
                id: record.id,
                outcome,
            });
        });
    }

    fn spawn(&self, job: impl FnOnce() + Send + 'static) {
        if let Some(pool) = self.pool.as_ref() {
            pool.spawn(job);
        } else {
            thread::spawn(job);
        }
    }
}
