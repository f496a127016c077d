use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use chrono::{Duration as ChronoDuration, NaiveDate};

use cube_pulse::aggregate::{AggregatedView, compute_counts, rank_countries};
use cube_pulse::country::CountryCode;
use cube_pulse::state::{CompetitionRecord, Selection};
use cube_pulse::wca_fetch::parse_competitions_json;

fn sample_records(n: usize) -> Vec<CompetitionRecord> {
    let base = NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date");
    (0..n)
        .map(|i| {
            let code = CountryCode::ALL[i % CountryCode::ALL.len()];
            let start = base + ChronoDuration::days(((i * 37) % 180) as i64);
            CompetitionRecord {
                id: format!("Comp{i}"),
                name: format!("Comp {i}"),
                city: "City".to_string(),
                country_code: code.as_str().to_string(),
                start_date: start,
                end_date: start,
                event_ids: vec!["333".to_string(), "222".to_string()],
                detail_url: String::new(),
                website_url: String::new(),
                short_name: None,
                venue_address: None,
                venue_details: None,
                latitude: None,
                longitude: None,
            }
        })
        .collect()
}

fn bench_wca_parse(c: &mut Criterion) {
    c.bench_function("wca_competitions_parse", |b| {
        b.iter(|| {
            let rows = parse_competitions_json(black_box(WCA_JSON)).unwrap();
            black_box(rows.len());
        })
    });
}

fn bench_view_build(c: &mut Criterion) {
    let records = sample_records(300);
    c.bench_function("aggregated_view_build", |b| {
        b.iter(|| {
            let view = AggregatedView::from_records(black_box(records.clone()));
            black_box(view.ranked_countries.len());
        })
    });
}

fn bench_counts_and_rank(c: &mut Criterion) {
    let records = sample_records(300);
    c.bench_function("counts_and_rank", |b| {
        b.iter(|| {
            let counts = compute_counts(black_box(&records));
            black_box(rank_countries(&counts).len());
        })
    });
}

fn bench_filter(c: &mut Criterion) {
    let view = AggregatedView::from_records(sample_records(300));
    let selection = Selection::Country("JP".to_string());
    c.bench_function("filter_by_country", |b| {
        b.iter(|| {
            black_box(view.filtered(black_box(&selection)).len());
        })
    });
}

criterion_group!(
    perf,
    bench_wca_parse,
    bench_view_build,
    bench_counts_and_rank,
    bench_filter
);
criterion_main!(perf);

static WCA_JSON: &str = include_str!("../tests/fixtures/wca_competitions_jp.json");
