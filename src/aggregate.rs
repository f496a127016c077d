use std::collections::BTreeMap;

use crate::state::{CompetitionRecord, Selection};

/// Derived projection of one record snapshot.
///
/// Rebuilt wholesale whenever the record set changes; the filtered listing is
/// computed on demand from `sorted_records` and the current selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedView {
    pub sorted_records: Vec<CompetitionRecord>,
    pub counts_by_country: BTreeMap<String, usize>,
    pub ranked_countries: Vec<String>,
}

impl AggregatedView {
    pub fn from_records(mut records: Vec<CompetitionRecord>) -> Self {
        sort_by_start(&mut records);
        let counts_by_country = compute_counts(&records);
        let ranked_countries = rank_countries(&counts_by_country);
        Self {
            sorted_records: records,
            counts_by_country,
            ranked_countries,
        }
    }

    pub fn filtered(&self, selection: &Selection) -> Vec<&CompetitionRecord> {
        filter_by_selection(&self.sorted_records, selection)
    }

    pub fn count_for(&self, code: &str) -> usize {
        self.counts_by_country.get(code).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.sorted_records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted_records.is_empty()
    }
}

/// Stable ascending sort on start date; equal dates keep input order.
pub fn sort_by_start(records: &mut [CompetitionRecord]) {
    records.sort_by_key(|r| r.start_date);
}

pub fn compute_counts(records: &[CompetitionRecord]) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.country_code.clone()).or_insert(0) += 1;
    }
    counts
}

/// Codes ordered by descending count, ties broken by code.
pub fn rank_countries(counts: &BTreeMap<String, usize>) -> Vec<String> {
    let mut ranked: Vec<(&String, usize)> = counts.iter().map(|(k, v)| (k, *v)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().map(|(code, _)| code.clone()).collect()
}

pub fn filter_by_selection<'a>(
    records: &'a [CompetitionRecord],
    selection: &Selection,
) -> Vec<&'a CompetitionRecord> {
    match selection {
        Selection::All => records.iter().collect(),
        Selection::Country(code) => records
            .iter()
            .filter(|r| r.country_code == *code)
            .collect(),
    }
}
