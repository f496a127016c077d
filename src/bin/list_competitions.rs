use anyhow::Result;
use chrono::Utc;

use cube_pulse::aggregate::AggregatedView;
use cube_pulse::country::CountryCatalog;
use cube_pulse::feed::ProviderConfig;
use cube_pulse::insight_fetch::{self, InsightKind};
use cube_pulse::orchestrator;
use cube_pulse::state::Selection;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let selection = std::env::var("LIST_SELECTION")
        .map(|raw| Selection::parse(&raw))
        .unwrap_or_default();
    let want_summary = std::env::var("LIST_SUMMARY")
        .ok()
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);

    let cfg = ProviderConfig::from_env();
    let catalog = CountryCatalog::supported();
    for rejected in &cfg.wca.rejected_countries {
        eprintln!("Ignoring unsupported country code {rejected}");
    }

    let source = cfg.build_source();
    let pool = orchestrator::build_fetch_pool(cfg.parallelism);
    let today = Utc::now().date_naive();
    let report =
        orchestrator::fetch_upcoming(source.as_ref(), &cfg.countries(), today, pool.as_ref());

    for (code, reason) in &report.failures {
        eprintln!("ERR {code}: {reason}");
    }

    let view = AggregatedView::from_records(report.records);
    println!(
        "{} upcoming competitions from {}",
        view.total(),
        today.format("%Y-%m-%d")
    );
    for code in &view.ranked_countries {
        println!(
            "  {} {:<16} {:>3}",
            catalog.flag(code),
            catalog.name(code),
            view.count_for(code)
        );
    }

    println!();
    println!("{}:", selection.label(&catalog));
    let filtered = view.filtered(&selection);
    if filtered.is_empty() {
        println!("  No competitions found for this selection.");
    }
    for record in filtered {
        println!(
            "  {:<16} {:<2} {:<40} {}",
            record.date_label(),
            record.country_code,
            record.name,
            record.city
        );
    }

    if want_summary {
        let insights = cfg.build_insights();
        let outcome = insight_fetch::request_summary(insights.as_ref(), &view.sorted_records);
        if outcome.is_failure() {
            eprintln!("Summary unavailable: {outcome:?}");
        }
        let text = outcome.display_text(InsightKind::Summary);
        if !text.is_empty() {
            println!();
            println!("{text}");
        }
    }

    Ok(())
}
