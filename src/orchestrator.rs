use std::collections::HashSet;

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::aggregate::sort_by_start;
use crate::country::CountryCode;
use crate::state::CompetitionRecord;
use crate::wca_fetch::CompetitionSource;

/// The settled result of one per-country retrieval.
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub country: CountryCode,
    pub result: Result<Vec<CompetitionRecord>, String>,
}

#[derive(Debug, Clone)]
pub struct FetchReport {
    pub reference_date: NaiveDate,
    pub records: Vec<CompetitionRecord>,
    pub failures: Vec<(CountryCode, String)>,
    pub stale_dropped: usize,
    pub duplicates_dropped: usize,
}

impl FetchReport {
    pub fn failed_codes(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|(code, _)| code.as_str().to_string())
            .collect()
    }
}

/// Issues one retrieval per country and waits for all of them.
///
/// No branch short-circuits or cancels another; each outcome is captured in
/// input order.
pub fn fetch_outcomes(
    source: &dyn CompetitionSource,
    countries: &[CountryCode],
    from: NaiveDate,
) -> Vec<SourceOutcome> {
    countries
        .par_iter()
        .map(|country| SourceOutcome {
            country: *country,
            result: source
                .fetch_country(*country, from)
                .map_err(|err| format!("{err:#}")),
        })
        .collect()
}

/// Concatenates the successful branches in input order and stable-sorts by
/// start date. Failed branches contribute nothing.
pub fn merge_outcomes(outcomes: Vec<SourceOutcome>, from: NaiveDate) -> FetchReport {
    let mut records = Vec::new();
    let mut failures = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut stale_dropped = 0usize;
    let mut duplicates_dropped = 0usize;

    for outcome in outcomes {
        match outcome.result {
            Ok(rows) => {
                for row in rows {
                    if row.start_date < from {
                        stale_dropped += 1;
                        continue;
                    }
                    if !seen.insert(row.id.clone()) {
                        duplicates_dropped += 1;
                        continue;
                    }
                    records.push(row);
                }
            }
            Err(reason) => failures.push((outcome.country, reason)),
        }
    }

    sort_by_start(&mut records);
    FetchReport {
        reference_date: from,
        records,
        failures,
        stale_dropped,
        duplicates_dropped,
    }
}

pub fn fetch_upcoming(
    source: &dyn CompetitionSource,
    countries: &[CountryCode],
    from: NaiveDate,
    pool: Option<&rayon::ThreadPool>,
) -> FetchReport {
    let outcomes = match pool {
        Some(pool) => pool.install(|| fetch_outcomes(source, countries, from)),
        None => fetch_outcomes(source, countries, from),
    };
    merge_outcomes(outcomes, from)
}

pub fn build_fetch_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|idx| format!("fetch-{idx}"))
        .build()
        .ok()
}

pub fn fetch_parallelism() -> usize {
    std::env::var("FETCH_PARALLELISM")
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(CountryCode::ALL.len())
        .clamp(2, 32)
}
