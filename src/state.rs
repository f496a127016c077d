use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, NaiveDate};

use crate::aggregate::AggregatedView;
use crate::country::CountryCatalog;
use crate::insight_fetch::{InsightKind, InsightOutcome};

/// One upcoming competition as delivered by a source.
#[derive(Debug, Clone, PartialEq)]
pub struct CompetitionRecord {
    pub id: String,
    pub name: String,
    pub city: String,
    pub country_code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub event_ids: Vec<String>,
    pub detail_url: String,
    pub website_url: String,
    pub short_name: Option<String>,
    pub venue_address: Option<String>,
    pub venue_details: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl CompetitionRecord {
    pub fn is_multi_day(&self) -> bool {
        self.start_date != self.end_date
    }

    /// True when the competition starts before `today + days`.
    pub fn starts_within(&self, today: NaiveDate, days: i64) -> bool {
        self.start_date < today + ChronoDuration::days(days)
    }

    pub fn date_label(&self) -> String {
        let start = self.start_date.format("%b %-d").to_string();
        if self.is_multi_day() {
            format!("{start} - {}", self.end_date.format("%b %-d"))
        } else {
            start
        }
    }

    /// First `limit` event ids, plus a `+N more` tail when truncated.
    pub fn event_badges(&self, limit: usize) -> Vec<String> {
        let mut out: Vec<String> = self.event_ids.iter().take(limit).cloned().collect();
        if self.event_ids.len() > limit {
            out.push(format!("+{} more", self.event_ids.len() - limit));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Country(String),
}

impl Selection {
    pub const ALL_SENTINEL: &'static str = "ALL";

    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(Self::ALL_SENTINEL) {
            Selection::All
        } else {
            Selection::Country(trimmed.to_ascii_uppercase())
        }
    }

    pub fn label(&self, catalog: &CountryCatalog) -> String {
        match self {
            Selection::All => "All Regions".to_string(),
            Selection::Country(code) => format!("{} {}", catalog.flag(code), catalog.name(code)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GuideView {
    pub record: CompetitionRecord,
    pub outcome: Option<InsightOutcome>,
    pub scroll: u16,
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    Refresh,
    FetchGuide(CompetitionRecord),
}

#[derive(Debug, Clone)]
pub enum Delta {
    LoadStarted,
    /// `generation` counts loads on the provider side; summaries carry the
    /// generation they were computed for.
    SetCompetitions {
        generation: u64,
        records: Vec<CompetitionRecord>,
        reference_date: NaiveDate,
        failed_countries: Vec<String>,
    },
    SetSummary {
        generation: u64,
        outcome: InsightOutcome,
    },
    SetGuide {
        id: String,
        outcome: InsightOutcome,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub catalog: Arc<CountryCatalog>,
    pub view: AggregatedView,
    pub selection: Selection,
    pub selected: usize,
    pub loading: bool,
    pub reference_date: Option<NaiveDate>,
    pub generation: u64,
    pub failed_countries: Vec<String>,
    pub summary: Option<InsightOutcome>,
    pub guide: Option<GuideView>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl AppState {
    pub fn new(catalog: Arc<CountryCatalog>) -> Self {
        Self {
            catalog,
            view: AggregatedView::default(),
            selection: Selection::All,
            selected: 0,
            loading: true,
            reference_date: None,
            generation: 0,
            failed_countries: Vec::new(),
            summary: None,
            guide: None,
            logs: VecDeque::with_capacity(200),
            help_overlay: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn filtered(&self) -> Vec<&CompetitionRecord> {
        self.view.filtered(&self.selection)
    }

    pub fn selected_record(&self) -> Option<&CompetitionRecord> {
        self.filtered().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let total = self.filtered().len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1) % total;
    }

    pub fn select_prev(&mut self) {
        let total = self.filtered().len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        if self.selected == 0 {
            self.selected = total - 1;
        } else {
            self.selected -= 1;
        }
    }

    /// `All` followed by the ranked countries; the order the filter strip shows.
    pub fn selection_options(&self) -> Vec<Selection> {
        let mut out = Vec::with_capacity(self.view.ranked_countries.len() + 1);
        out.push(Selection::All);
        out.extend(
            self.view
                .ranked_countries
                .iter()
                .map(|code| Selection::Country(code.clone())),
        );
        out
    }

    pub fn cycle_selection(&mut self, forward: bool) {
        let options = self.selection_options();
        let total = options.len();
        let current = options
            .iter()
            .position(|s| *s == self.selection)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % total
        } else {
            (current + total - 1) % total
        };
        self.set_selection(options[next].clone());
    }

    pub fn set_selection(&mut self, selection: Selection) {
        if self.selection != selection {
            self.selection = selection;
            self.selected = 0;
        }
    }

    pub fn open_guide(&mut self) -> Option<CompetitionRecord> {
        let record = self.selected_record()?.clone();
        self.guide = Some(GuideView {
            record: record.clone(),
            outcome: None,
            scroll: 0,
        });
        Some(record)
    }

    pub fn close_guide(&mut self) {
        self.guide = None;
    }

    pub fn summary_text(&self) -> Option<String> {
        self.summary
            .as_ref()
            .map(|outcome| outcome.display_text(InsightKind::Summary))
    }

    pub fn guide_text(&self) -> Option<String> {
        let guide = self.guide.as_ref()?;
        guide
            .outcome
            .as_ref()
            .map(|outcome| outcome.display_text(InsightKind::Guide))
    }

    fn clamp_selected(&mut self) {
        let total = self.filtered().len();
        if total == 0 {
            self.selected = 0;
        } else if self.selected >= total {
            self.selected = total - 1;
        }
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::LoadStarted => {
            state.loading = true;
        }
        Delta::SetCompetitions {
            generation,
            records,
            reference_date,
            failed_countries,
        } => {
            let selected_id = state.selected_record().map(|r| r.id.clone());
            state.view = AggregatedView::from_records(records);
            state.loading = false;
            state.reference_date = Some(reference_date);
            state.generation = generation;
            state.failed_countries = failed_countries;
            state.summary = None;

            // Keep the cursor on the same competition across refreshes.
            let restored = selected_id
                .and_then(|id| state.filtered().iter().position(|r| r.id == id));
            if let Some(idx) = restored {
                state.selected = idx;
            }
            state.clamp_selected();
        }
        Delta::SetSummary {
            generation,
            outcome,
        } => {
            // A summary from an earlier load describes records no longer shown.
            if generation == state.generation {
                state.summary = Some(outcome);
            }
        }
        Delta::SetGuide { id, outcome } => {
            if let Some(guide) = state.guide.as_mut()
                && guide.record.id == id
            {
                guide.outcome = Some(outcome);
            }
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        id: &str,
        start: (i32, u32, u32),
        end: (i32, u32, u32),
        events: usize,
    ) -> CompetitionRecord {
        CompetitionRecord {
            id: id.to_string(),
            name: id.to_string(),
            city: "Taipei".to_string(),
            country_code: "TW".to_string(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            event_ids: (0..events).map(|i| format!("e{i}")).collect(),
            detail_url: String::new(),
            website_url: String::new(),
            short_name: None,
            venue_address: None,
            venue_details: None,
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn date_label_formats_single_and_multi_day() {
        assert_eq!(record("a", (2025, 6, 1), (2025, 6, 1), 1).date_label(), "Jun 1");
        assert_eq!(
            record("b", (2025, 6, 28), (2025, 7, 2), 1).date_label(),
            "Jun 28 - Jul 2"
        );
    }

    #[test]
    fn soon_badge_uses_strict_window() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(record("a", (2025, 6, 7), (2025, 6, 7), 1).starts_within(today, 7));
        assert!(!record("b", (2025, 6, 8), (2025, 6, 8), 1).starts_within(today, 7));
    }

    #[test]
    fn event_badges_truncate_with_tail() {
        let badges = record("a", (2025, 6, 1), (2025, 6, 1), 8).event_badges(5);
        assert_eq!(badges.len(), 6);
        assert_eq!(badges[5], "+3 more");
        assert_eq!(record("b", (2025, 6, 1), (2025, 6, 1), 5).event_badges(5).len(), 5);
    }

    #[test]
    fn selection_parses_sentinel() {
        assert_eq!(Selection::parse("all"), Selection::All);
        assert_eq!(Selection::parse(""), Selection::All);
        assert_eq!(Selection::parse(" jp "), Selection::Country("JP".to_string()));
    }
}
