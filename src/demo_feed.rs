use std::env;

use anyhow::Result;
use chrono::{Duration as ChronoDuration, NaiveDate};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::country::CountryCode;
use crate::insight_fetch::InsightClient;
use crate::state::CompetitionRecord;
use crate::wca_fetch::CompetitionSource;

const EVENT_POOL: [&str; 12] = [
    "333", "222", "444", "555", "333oh", "333bf", "pyram", "skewb", "clock", "minx", "sq1", "333fm",
];

/// Offline source producing plausible upcoming competitions.
///
/// `DEMO_FAIL_RATE` (0.0..=1.0) makes a share of per-country retrievals fail so
/// the partial-failure path can be seen without a flaky network.
pub struct DemoSource {
    fail_rate: f64,
    max_per_country: usize,
}

impl DemoSource {
    /// A non-finite `fail_rate` means no injected failures.
    pub fn new(fail_rate: f64, max_per_country: usize) -> Self {
        let fail_rate = if fail_rate.is_finite() {
            fail_rate.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            fail_rate,
            max_per_country: max_per_country.max(1),
        }
    }

    pub fn from_env() -> Self {
        let fail_rate = env::var("DEMO_FAIL_RATE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(0.0);
        let max_per_country = env::var("DEMO_MAX_PER_COUNTRY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(6)
            .clamp(1, 50);
        Self::new(fail_rate, max_per_country)
    }
}

impl CompetitionSource for DemoSource {
    fn fetch_country(
        &self,
        country: CountryCode,
        from: NaiveDate,
    ) -> Result<Vec<CompetitionRecord>> {
        let mut rng = rand::thread_rng();
        if rng.gen_bool(self.fail_rate) {
            return Err(anyhow::anyhow!("demo outage for {country}"));
        }

        let cities = demo_cities(country);
        let count = rng.gen_range(0..=self.max_per_country);
        let mut out = Vec::with_capacity(count);
        for idx in 0..count {
            let city = cities.choose(&mut rng).copied().unwrap_or("Capital");
            let start = from + ChronoDuration::days(rng.gen_range(0..180));
            let end = start + ChronoDuration::days(rng.gen_range(0..3));
            let mut events: Vec<String> = EVENT_POOL.iter().map(|e| e.to_string()).collect();
            events.shuffle(&mut rng);
            events.truncate(rng.gen_range(1..=EVENT_POOL.len()));

            let name = format!("{} Cube Open {}", city, start.format("%Y"));
            let id = format!(
                "{}{}{}",
                city.replace(' ', ""),
                idx + 1,
                start.format("%Y%m%d")
            );
            out.push(CompetitionRecord {
                detail_url: format!("https://example.invalid/competitions/{id}"),
                website_url: format!("https://example.invalid/competitions/{id}/info"),
                id,
                name,
                city: city.to_string(),
                country_code: country.as_str().to_string(),
                start_date: start,
                end_date: end,
                event_ids: events,
                short_name: None,
                venue_address: None,
                venue_details: None,
                latitude: None,
                longitude: None,
            });
        }
        Ok(out)
    }
}

/// Stands in for the generative-text service in demo mode.
pub struct CannedInsights;

impl InsightClient for CannedInsights {
    fn generate(&self, prompt: &str) -> Result<String> {
        let lines = prompt
            .lines()
            .filter(|line| line.contains(" on 20"))
            .count();
        if lines > 0 {
            Ok(format!(
                "Demo mode: {lines} upcoming competitions were summarised. \
                 Set GEMINI_API_KEY to get a real analysis."
            ))
        } else {
            Ok("Demo mode travel guide.\n\n\
                - Fun fact: every city has at least one cuber.\n\
                - Weather: bring a jacket, venues are air-conditioned.\n\
                - Must-eat: whatever the locals queue for.\n\
                - Getting around: public transit, then walk."
                .to_string())
        }
    }
}

fn demo_cities(country: CountryCode) -> &'static [&'static str] {
    match country {
        CountryCode::CN => &["Beijing", "Shanghai", "Shenzhen", "Chengdu"],
        CountryCode::TW => &["Taipei", "Taichung", "Kaohsiung"],
        CountryCode::HK => &["Hong Kong"],
        CountryCode::MO => &["Macau"],
        CountryCode::JP => &["Tokyo", "Osaka", "Nagoya", "Fukuoka"],
        CountryCode::KR => &["Seoul", "Busan", "Daejeon"],
        CountryCode::SG => &["Singapore"],
        CountryCode::MY => &["Kuala Lumpur", "Penang", "Johor Bahru"],
        CountryCode::VN => &["Hanoi", "Ho Chi Minh City", "Da Nang"],
        CountryCode::TH => &["Bangkok", "Chiang Mai"],
    }
}
