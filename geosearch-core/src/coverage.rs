//! Static per-provider country coverage.
//!
//! Each provider has two independent facts:
//!
//! - an **exact** set: countries the provider accepts natively as a
//!   country parameter;
//! - a **proxy** map: uncovered country → substitute country that the
//!   provider does support exactly. Proxies never chain; an entry whose
//!   substitute is not itself exactly supported resolves to nothing.
//!
//! The tables are a snapshot of provider documentation. Their sizes are
//! pinned by tests so that edits are deliberate.

use crate::country::CountryCode;
use crate::types::ProviderId;

/// Coverage facts for a single provider.
#[derive(Debug, Clone, Copy)]
pub struct CoverageTable {
    /// Exactly supported countries (uppercase ISO codes).
    pub exact: &'static [&'static str],
    /// `(uncovered, substitute)` pairs.
    pub proxies: &'static [(&'static str, &'static str)],
}

impl CoverageTable {
    /// Returns `true` if `country` is natively supported.
    pub fn supports_exact(&self, country: CountryCode) -> bool {
        self.exact.contains(&country.as_str())
    }

    /// Substitute country for `country`, if the provider lacks exact support
    /// and the substitute is itself exactly supported.
    pub fn resolve_proxy(&self, country: CountryCode) -> Option<CountryCode> {
        if self.supports_exact(country) {
            return None;
        }
        self.proxies
            .iter()
            .find(|(from, _)| *from == country.as_str())
            .and_then(|(_, to)| CountryCode::parse(to))
            .filter(|substitute| self.supports_exact(*substitute))
    }
}

const BRAVE_EXACT: &[&str] = &[
    "AR", "AT", "AU", "BE", "BR", "CA", "CH", "CL", "CN", "DE", "DK", "ES", "FI", "FR", "GB",
    "HK", "ID", "IN", "IT", "JP", "KR", "MX", "MY", "NL", "NO", "NZ", "PH", "PL", "PT", "RU",
    "SA", "SE", "TR", "TW", "US", "ZA",
];

const BRAVE_PROXIES: &[(&str, &str)] = &[
    // British Isles and crown dependencies
    ("IE", "GB"), ("IM", "GB"), ("JE", "GB"), ("GG", "GB"), ("GI", "GB"),
    // European microstates
    ("LU", "BE"), ("MC", "FR"), ("AD", "ES"), ("SM", "IT"), ("VA", "IT"), ("LI", "CH"),
    // Nordics
    ("GL", "DK"), ("FO", "DK"), ("AX", "FI"), ("SJ", "NO"),
    // Asia
    ("MO", "HK"), ("SG", "MY"), ("BN", "MY"), ("TL", "ID"),
    // Latin America
    ("UY", "AR"), ("PY", "AR"), ("BO", "CL"), ("PE", "CL"), ("CO", "MX"), ("VE", "MX"),
    ("EC", "MX"), ("CR", "MX"), ("PA", "MX"), ("GT", "MX"), ("HN", "MX"), ("SV", "MX"),
    ("NI", "MX"), ("CU", "MX"), ("DO", "MX"),
    // US territories
    ("PR", "US"), ("UM", "US"), ("VI", "US"), ("GU", "US"), ("AS", "US"), ("MP", "US"),
    // Southern Africa
    ("NA", "ZA"), ("BW", "ZA"), ("LS", "ZA"), ("SZ", "ZA"),
    // Russian-speaking
    ("BY", "RU"), ("KZ", "RU"), ("KG", "RU"),
    // Gulf
    ("AE", "SA"), ("KW", "SA"), ("QA", "SA"), ("BH", "SA"), ("OM", "SA"), ("YE", "SA"),
    ("AZ", "TR"),
    // French overseas
    ("NC", "FR"), ("PF", "FR"), ("RE", "FR"), ("GP", "FR"), ("MQ", "FR"), ("GF", "FR"),
    ("YT", "FR"), ("PM", "FR"), ("BL", "FR"), ("MF", "FR"), ("WF", "FR"),
    // Dutch Caribbean
    ("AW", "NL"), ("CW", "NL"), ("SX", "NL"), ("BQ", "NL"),
    // Oceania
    ("NF", "AU"), ("CX", "AU"), ("CC", "AU"), ("CK", "NZ"), ("NU", "NZ"), ("TK", "NZ"),
    // Lusophone
    ("AO", "PT"), ("MZ", "PT"), ("CV", "PT"), ("GW", "PT"), ("ST", "PT"),
];

const SERPER_EXACT: &[&str] = &[
    "AE", "AR", "AT", "AU", "BD", "BE", "BG", "BO", "BR", "BY", "CA", "CH", "CL", "CN", "CO",
    "CR", "CY", "CZ", "DE", "DK", "DO", "DZ", "EC", "EE", "EG", "ES", "FI", "FR", "GB", "GH",
    "GR", "GT", "HK", "HR", "HU", "ID", "IE", "IL", "IN", "IS", "IT", "JO", "JP", "KE", "KR",
    "KW", "KZ", "LB", "LK", "LT", "LU", "LV", "MA", "MT", "MX", "MY", "NG", "NL", "NO", "NP",
    "NZ", "PA", "PE", "PH", "PK", "PL", "PR", "PT", "PY", "QA", "RO", "RS", "RU", "SA", "SE",
    "SG", "SI", "SK", "TH", "TN", "TR", "TW", "UA", "US", "UY", "VE", "VN", "ZA",
];

const SERPER_PROXIES: &[(&str, &str)] = &[
    ("MC", "FR"), ("AD", "ES"), ("SM", "IT"), ("VA", "IT"), ("LI", "CH"),
    ("IM", "GB"), ("JE", "GB"), ("GG", "GB"), ("GI", "GB"),
    ("GL", "DK"), ("FO", "DK"), ("AX", "FI"), ("SJ", "NO"),
    ("MO", "HK"), ("BN", "MY"), ("TL", "ID"),
    ("HN", "GT"), ("SV", "GT"), ("NI", "CR"), ("CU", "DO"),
    ("BH", "SA"), ("OM", "AE"), ("YE", "SA"), ("SY", "LB"), ("IQ", "JO"),
    ("UG", "KE"), ("TZ", "KE"), ("RW", "KE"), ("ET", "KE"),
    ("ZM", "ZA"), ("ZW", "ZA"), ("NA", "ZA"), ("BW", "ZA"), ("LS", "ZA"), ("SZ", "ZA"),
    // Francophone Africa
    ("SN", "FR"), ("CI", "FR"), ("CM", "FR"), ("ML", "FR"), ("BF", "FR"), ("NE", "FR"),
    ("TG", "FR"), ("BJ", "FR"), ("GA", "FR"), ("CG", "FR"), ("CD", "FR"), ("MG", "FR"),
    ("LY", "TN"), ("MR", "MA"),
    // Central Asia and eastern Europe
    ("KG", "KZ"), ("TJ", "RU"), ("UZ", "RU"), ("TM", "RU"),
    ("MD", "RO"), ("MK", "BG"), ("AL", "GR"), ("ME", "RS"), ("BA", "HR"),
    // South and south-east Asia
    ("KH", "TH"), ("LA", "TH"), ("MM", "TH"), ("MV", "LK"), ("BT", "NP"), ("AF", "PK"),
    // Lusophone
    ("AO", "PT"), ("MZ", "PT"), ("CV", "PT"),
];

const MOJEEK_EXACT: &[&str] = &[
    "AT", "AU", "BE", "BR", "CA", "CH", "DE", "DK", "ES", "FI", "FR", "GB", "IE", "IN", "IT",
    "JP", "MX", "NL", "NO", "NZ", "PL", "PT", "SE", "US",
];

const MOJEEK_PROXIES: &[(&str, &str)] = &[
    ("LU", "BE"), ("MC", "FR"), ("LI", "CH"), ("AD", "ES"), ("SM", "IT"), ("VA", "IT"),
    ("IM", "GB"), ("JE", "GB"), ("GG", "GB"), ("GI", "GB"),
    ("IS", "NO"), ("AX", "FI"), ("FO", "DK"), ("GL", "DK"), ("PR", "US"),
];

static BRAVE: CoverageTable = CoverageTable {
    exact: BRAVE_EXACT,
    proxies: BRAVE_PROXIES,
};

static SERPER: CoverageTable = CoverageTable {
    exact: SERPER_EXACT,
    proxies: SERPER_PROXIES,
};

static MOJEEK: CoverageTable = CoverageTable {
    exact: MOJEEK_EXACT,
    proxies: MOJEEK_PROXIES,
};

/// The static coverage snapshot for `provider`.
pub fn table_for(provider: ProviderId) -> &'static CoverageTable {
    match provider {
        ProviderId::Brave => &BRAVE,
        ProviderId::Serper => &SERPER,
        ProviderId::Mojeek => &MOJEEK,
    }
}

/// Does `provider` accept `country` natively?
pub fn supports_exact(provider: ProviderId, country: CountryCode) -> bool {
    table_for(provider).supports_exact(country)
}

/// Deterministic substitute for `country` on `provider`, if any.
pub fn resolve_proxy(provider: ProviderId, country: CountryCode) -> Option<CountryCode> {
    table_for(provider).resolve_proxy(country)
}

/// Returns `true` if at least one provider exactly supports `country`.
pub fn has_any_exact_support(country: CountryCode) -> bool {
    ProviderId::all()
        .iter()
        .any(|provider| supports_exact(*provider, country))
}

/// Returns `true` if at least one provider supports `country` exactly or via proxy.
pub fn has_any_targeted_support(country: CountryCode) -> bool {
    ProviderId::all().iter().any(|provider| {
        supports_exact(*provider, country) || resolve_proxy(*provider, country).is_some()
    })
}

/// Provider-specific encoding of a country parameter.
///
/// Brave wants uppercase codes. Serper (Google `gl`) wants lowercase.
/// Mojeek wants lowercase and uses `uk` for the United Kingdom.
pub fn country_param(provider: ProviderId, country: CountryCode) -> String {
    match provider {
        ProviderId::Brave => country.as_str().to_owned(),
        ProviderId::Serper => country.as_str().to_ascii_lowercase(),
        ProviderId::Mojeek => match country.as_str() {
            "GB" => "uk".to_owned(),
            other => other.to_ascii_lowercase(),
        },
    }
}

/// Country parameter for the provider's worldwide route.
///
/// Brave requires the explicit `ALL` sentinel; the others omit the parameter.
pub fn global_param(provider: ProviderId) -> Option<&'static str> {
    match provider {
        ProviderId::Brave => Some("ALL"),
        ProviderId::Serper | ProviderId::Mojeek => None,
    }
}

/// How one provider can serve one country.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderCoverage {
    /// Native support.
    Exact,
    /// Served through a substitute country.
    Proxy(CountryCode),
    /// Only the worldwide route is available.
    Global,
}

/// Per-provider coverage of `country`, in [`ProviderId::all`] order.
pub fn coverage_of(country: CountryCode) -> Vec<(ProviderId, ProviderCoverage)> {
    ProviderId::all()
        .iter()
        .map(|provider| {
            let coverage = if supports_exact(*provider, country) {
                ProviderCoverage::Exact
            } else if let Some(substitute) = resolve_proxy(*provider, country) {
                ProviderCoverage::Proxy(substitute)
            } else {
                ProviderCoverage::Global
            };
            (*provider, coverage)
        })
        .collect()
}

/// Aggregate counts over the whole country universe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CoverageSummary {
    /// Size of the country universe.
    pub universe: usize,
    /// Countries exactly supported by at least one provider.
    pub exact: usize,
    /// Countries supported exactly or via proxy by at least one provider.
    pub targeted: usize,
}

/// Count exact and targeted support across all 249 countries.
pub fn coverage_summary() -> CoverageSummary {
    let mut summary = CoverageSummary {
        universe: 0,
        exact: 0,
        targeted: 0,
    };
    for country in CountryCode::all() {
        summary.universe += 1;
        if has_any_exact_support(country) {
            summary.exact += 1;
        }
        if has_any_targeted_support(country) {
            summary.targeted += 1;
        }
    }
    summary
}
