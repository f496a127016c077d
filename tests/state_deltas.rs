use std::sync::Arc;

use chrono::NaiveDate;

use cube_pulse::country::CountryCatalog;
use cube_pulse::insight_fetch::{GUIDE_ERROR_FALLBACK, InsightOutcome};
use cube_pulse::state::{AppState, CompetitionRecord, Delta, Selection, apply_delta};

fn record(id: &str, country: &str, start: &str) -> CompetitionRecord {
    let date = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    CompetitionRecord {
        id: id.to_string(),
        name: format!("{id} Open"),
        city: "City".to_string(),
        country_code: country.to_string(),
        start_date: date,
        end_date: date,
        event_ids: vec!["333".to_string()],
        detail_url: String::new(),
        website_url: String::new(),
        short_name: None,
        venue_address: None,
        venue_details: None,
        latitude: None,
        longitude: None,
    }
}

fn loaded_state(records: Vec<CompetitionRecord>) -> AppState {
    let mut state = AppState::new(Arc::new(CountryCatalog::supported()));
    apply_delta(
        &mut state,
        Delta::SetCompetitions {
            generation: 1,
            records,
            reference_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            failed_countries: vec!["TH".to_string()],
        },
    );
    state
}

fn sample() -> Vec<CompetitionRecord> {
    vec![
        record("A", "JP", "2025-06-01"),
        record("B", "JP", "2025-05-01"),
        record("C", "KR", "2025-05-01"),
    ]
}

#[test]
fn set_competitions_builds_view_and_stops_loading() {
    let state = loaded_state(sample());
    assert!(!state.loading);
    assert_eq!(state.view.total(), 3);
    assert_eq!(state.failed_countries, vec!["TH".to_string()]);
    let listed: Vec<&str> = state.filtered().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(listed, vec!["B", "C", "A"]);
    assert!(state.summary.is_none());
}

#[test]
fn selection_cycles_through_ranked_countries() {
    let mut state = loaded_state(sample());
    assert_eq!(
        state.selection_options(),
        vec![
            Selection::All,
            Selection::Country("JP".to_string()),
            Selection::Country("KR".to_string()),
        ]
    );

    state.cycle_selection(true);
    assert_eq!(state.selection, Selection::Country("JP".to_string()));
    assert_eq!(state.filtered().len(), 2);

    state.cycle_selection(true);
    state.cycle_selection(true);
    assert_eq!(state.selection, Selection::All);

    state.cycle_selection(false);
    assert_eq!(state.selection, Selection::Country("KR".to_string()));
}

#[test]
fn refresh_keeps_cursor_on_same_competition() {
    let mut state = loaded_state(sample());
    state.select_next();
    state.select_next();
    assert_eq!(state.selected_record().map(|r| r.id.as_str()), Some("A"));

    let mut refreshed = sample();
    refreshed.insert(0, record("Z", "SG", "2025-02-01"));
    apply_delta(
        &mut state,
        Delta::SetCompetitions {
            generation: 2,
            records: refreshed,
            reference_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            failed_countries: Vec::new(),
        },
    );
    assert_eq!(state.selected_record().map(|r| r.id.as_str()), Some("A"));
}

#[test]
fn selected_index_clamps_when_listing_shrinks() {
    let mut state = loaded_state(sample());
    state.selected = 2;
    apply_delta(
        &mut state,
        Delta::SetCompetitions {
            generation: 2,
            records: vec![record("B", "JP", "2025-05-01")],
            reference_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            failed_countries: Vec::new(),
        },
    );
    assert_eq!(state.selected, 0);
}

#[test]
fn guide_outcome_only_lands_on_open_modal() {
    let mut state = loaded_state(sample());
    let opened = state.open_guide().expect("a record is selected");
    assert_eq!(opened.id, "B");
    assert!(state.guide_text().is_none());

    apply_delta(
        &mut state,
        Delta::SetGuide {
            id: "C".to_string(),
            outcome: InsightOutcome::Generated("wrong one".to_string()),
        },
    );
    assert!(state.guide_text().is_none());

    apply_delta(
        &mut state,
        Delta::SetGuide {
            id: "B".to_string(),
            outcome: InsightOutcome::Failed("timeout".to_string()),
        },
    );
    assert_eq!(state.guide_text().as_deref(), Some(GUIDE_ERROR_FALLBACK));

    state.close_guide();
    assert!(state.guide.is_none());
}

#[test]
fn summary_failure_reads_as_empty_text() {
    let mut state = loaded_state(sample());
    apply_delta(
        &mut state,
        Delta::SetSummary {
            generation: 1,
            outcome: InsightOutcome::Failed("quota".to_string()),
        },
    );
    // The display channel cannot tell "said nothing" from "is down"; the
    // structured outcome still can.
    assert_eq!(state.summary_text().as_deref(), Some(""));
    assert!(state.summary.as_ref().is_some_and(|o| o.is_failure()));
}

#[test]
fn summary_from_previous_load_is_dropped() {
    let mut state = loaded_state(sample());
    apply_delta(
        &mut state,
        Delta::SetCompetitions {
            generation: 2,
            records: Vec::new(),
            reference_date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            failed_countries: Vec::new(),
        },
    );
    apply_delta(
        &mut state,
        Delta::SetSummary {
            generation: 1,
            outcome: InsightOutcome::Generated("summary of old load".to_string()),
        },
    );
    assert!(state.view.is_empty());
    assert!(state.summary.is_none());

    apply_delta(
        &mut state,
        Delta::SetSummary {
            generation: 2,
            outcome: InsightOutcome::NotRequested,
        },
    );
    assert_eq!(state.summary_text().as_deref(), Some(""));
}

#[test]
fn logs_are_capped() {
    let mut state = AppState::new(Arc::new(CountryCatalog::supported()));
    for i in 0..250 {
        apply_delta(&mut state, Delta::Log(format!("[INFO] line {i}")));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("[INFO] line 50"));
}
