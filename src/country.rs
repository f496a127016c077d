use std::fmt;

/// Glyph shown for codes outside the supported set.
pub const UNKNOWN_FLAG: &str = "🏳";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CountryCode {
    CN,
    TW,
    HK,
    MO,
    JP,
    KR,
    SG,
    MY,
    VN,
    TH,
}

impl CountryCode {
    pub const ALL: [CountryCode; 10] = [
        CountryCode::CN,
        CountryCode::TW,
        CountryCode::HK,
        CountryCode::MO,
        CountryCode::JP,
        CountryCode::KR,
        CountryCode::SG,
        CountryCode::MY,
        CountryCode::VN,
        CountryCode::TH,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CountryCode::CN => "CN",
            CountryCode::TW => "TW",
            CountryCode::HK => "HK",
            CountryCode::MO => "MO",
            CountryCode::JP => "JP",
            CountryCode::KR => "KR",
            CountryCode::SG => "SG",
            CountryCode::MY => "MY",
            CountryCode::VN => "VN",
            CountryCode::TH => "TH",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim();
        Self::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(wanted))
    }

    fn display_name(self) -> &'static str {
        match self {
            CountryCode::CN => "China",
            CountryCode::TW => "Chinese Taipei",
            CountryCode::HK => "Hong Kong",
            CountryCode::MO => "Macau",
            CountryCode::JP => "Japan",
            CountryCode::KR => "Korea",
            CountryCode::SG => "Singapore",
            CountryCode::MY => "Malaysia",
            CountryCode::VN => "Vietnam",
            CountryCode::TH => "Thailand",
        }
    }

    fn flag(self) -> &'static str {
        match self {
            CountryCode::CN => "🇨🇳",
            CountryCode::TW => "🇹🇼",
            CountryCode::HK => "🇭🇰",
            CountryCode::MO => "🇲🇴",
            CountryCode::JP => "🇯🇵",
            CountryCode::KR => "🇰🇷",
            CountryCode::SG => "🇸🇬",
            CountryCode::MY => "🇲🇾",
            CountryCode::VN => "🇻🇳",
            CountryCode::TH => "🇹🇭",
        }
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct CountryEntry {
    pub code: CountryCode,
    pub name: &'static str,
    pub flag: &'static str,
}

/// Code to display-name and code to flag lookups.
///
/// Built once at startup and handed to whatever needs it; never mutated
/// afterwards. Lookups take raw codes so records from outside the supported
/// set still resolve to a defined fallback.
#[derive(Debug, Clone)]
pub struct CountryCatalog {
    entries: Vec<CountryEntry>,
}

impl CountryCatalog {
    pub fn supported() -> Self {
        Self::with_codes(&CountryCode::ALL)
    }

    pub fn with_codes(codes: &[CountryCode]) -> Self {
        let mut entries: Vec<CountryEntry> = Vec::with_capacity(codes.len());
        for code in codes {
            if entries.iter().any(|e| e.code == *code) {
                continue;
            }
            entries.push(CountryEntry {
                code: *code,
                name: code.display_name(),
                flag: code.flag(),
            });
        }
        Self { entries }
    }

    pub fn codes(&self) -> Vec<CountryCode> {
        self.entries.iter().map(|e| e.code).collect()
    }

    pub fn entries(&self) -> &[CountryEntry] {
        &self.entries
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entry(code).is_some()
    }

    /// Display name, or the code itself when it is not in the catalog.
    pub fn name<'a>(&self, code: &'a str) -> &'a str {
        match self.entry(code) {
            Some(entry) => entry.name,
            None => code,
        }
    }

    pub fn flag(&self, code: &str) -> &'static str {
        self.entry(code).map(|e| e.flag).unwrap_or(UNKNOWN_FLAG)
    }

    fn entry(&self, code: &str) -> Option<&CountryEntry> {
        let code = code.trim();
        self.entries
            .iter()
            .find(|e| e.code.as_str().eq_ignore_ascii_case(code))
    }
}

/// Parses a comma/semicolon/space separated list of codes.
///
/// Returns the recognised codes in input order (deduplicated) and the raw
/// tokens that did not match the supported set.
pub fn parse_code_list(raw: &str) -> (Vec<CountryCode>, Vec<String>) {
    let mut codes = Vec::new();
    let mut rejected = Vec::new();
    for part in raw.split([',', ';', ' ']) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match CountryCode::parse(part) {
            Some(code) => {
                if !codes.contains(&code) {
                    codes.push(code);
                }
            }
            None => rejected.push(part.to_string()),
        }
    }
    (codes, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_catalog_covers_all_codes() {
        let catalog = CountryCatalog::supported();
        assert_eq!(catalog.codes().len(), 10);
        assert_eq!(catalog.name("TW"), "Chinese Taipei");
        assert_eq!(catalog.flag("JP"), "🇯🇵");
        assert!(catalog.contains("kr"));
    }

    #[test]
    fn unknown_codes_fall_back() {
        let catalog = CountryCatalog::supported();
        assert!(!catalog.contains("US"));
        assert_eq!(catalog.name("US"), "US");
        assert_eq!(catalog.flag("US"), UNKNOWN_FLAG);
    }

    #[test]
    fn restricted_catalog_hides_other_codes() {
        let catalog = CountryCatalog::with_codes(&[CountryCode::JP, CountryCode::JP]);
        assert_eq!(catalog.entries().len(), 1);
        assert_eq!(catalog.name("KR"), "KR");
    }

    #[test]
    fn code_list_parsing_reports_rejects() {
        let (codes, rejected) = parse_code_list("jp, KR;xx  JP");
        assert_eq!(codes, vec![CountryCode::JP, CountryCode::KR]);
        assert_eq!(rejected, vec!["xx".to_string()]);
    }
}
