use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use cube_pulse::insight_fetch::parse_generate_response_json;
use cube_pulse::wca_fetch::parse_competitions_json;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_wca_competitions_fixture() {
    let raw = read_fixture("wca_competitions_jp.json");
    let rows = parse_competitions_json(&raw).expect("fixture should parse");
    // Rows with an unparsable or null start date are skipped; the rest of the
    // batch survives.
    assert_eq!(rows.len(), 3);

    let tokyo = &rows[0];
    assert_eq!(tokyo.id, "TokyoAutumn2026");
    assert_eq!(tokyo.country_code, "JP");
    assert_eq!(tokyo.start_date, NaiveDate::from_ymd_opt(2026, 11, 7).unwrap());
    assert_eq!(tokyo.end_date, NaiveDate::from_ymd_opt(2026, 11, 8).unwrap());
    assert!(tokyo.is_multi_day());
    assert_eq!(tokyo.event_ids.len(), 7);
    assert_eq!(tokyo.venue_details.as_deref(), Some("Hall B"));
    assert!(tokyo.latitude.is_some_and(|lat| (lat - 35.658).abs() < 1e-9));

    let osaka = &rows[1];
    assert_eq!(osaka.website_url, "https://osaka-open.example");
    assert!(osaka.venue_address.is_none());
    assert!(osaka.short_name.is_none());
    assert!(!osaka.is_multi_day());

    let sendai = &rows[2];
    assert_eq!(sendai.id, "SendaiCube2026");
    assert_eq!(sendai.city, "");
    assert_eq!(sendai.end_date, sendai.start_date);
}

#[test]
fn wca_null_and_empty_are_empty() {
    assert!(parse_competitions_json("null").expect("null should parse").is_empty());
    assert!(parse_competitions_json("").expect("empty should parse").is_empty());
    assert!(parse_competitions_json("[]").expect("[] should parse").is_empty());
}

#[test]
fn wca_error_body_is_an_error() {
    assert!(parse_competitions_json(r#"{"error":"Not found"}"#).is_err());
}

#[test]
fn parses_gemini_fixture() {
    let raw = read_fixture("gemini_generate.json");
    let text = parse_generate_response_json(&raw).expect("fixture should parse");
    assert!(text.starts_with("China is clearly the busiest region"));
    assert!(text.ends_with("weekend competitions."));
}
