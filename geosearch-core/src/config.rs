//! Router configuration with sensible defaults.
//!
//! [`RouterConfig`] controls provider priority, per-call timeouts, result
//! counts, caching and the cost-control ceilings. Every struct here is
//! `#[serde(default)]` so a partial TOML table fills the rest from
//! [`Default`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::SearchError;
use crate::types::ProviderId;

/// Rate-limit and daily-budget ceilings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    /// Sliding window length in seconds.
    pub rate_limit_window_seconds: u64,
    /// Admissions per client identity inside the window.
    pub rate_limit_max_requests: u32,
    /// Server-credential upstream calls allowed per UTC day.
    pub daily_miss_budget: u32,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            rate_limit_window_seconds: 3600,
            rate_limit_max_requests: 30,
            daily_miss_budget: 1500,
        }
    }
}

/// Base URLs for each provider's search endpoint.
///
/// Overridable so tests and self-hosted relays can point the router at a
/// different host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Brave Search web endpoint.
    pub brave: String,
    /// Serper search endpoint.
    pub serper: String,
    /// Mojeek search endpoint.
    pub mojeek: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            brave: "https://api.search.brave.com/res/v1/web/search".to_owned(),
            serper: "https://google.serper.dev/search".to_owned(),
            mojeek: "https://www.mojeek.com/search".to_owned(),
        }
    }
}

impl EndpointConfig {
    /// Endpoint for `provider`.
    pub fn for_provider(&self, provider: ProviderId) -> &str {
        match provider {
            ProviderId::Brave => &self.brave,
            ProviderId::Serper => &self.serper,
            ProviderId::Mojeek => &self.mojeek,
        }
    }
}

/// Configuration for the search router.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Provider priority; earlier providers are tried first within a tier.
    pub providers: Vec<ProviderId>,
    /// Per-call upstream timeout in seconds.
    pub timeout_seconds: u64,
    /// Number of results requested from each provider.
    pub max_results: usize,
    /// How long to cache cacheable responses in seconds. 0 disables caching.
    pub cache_ttl_seconds: u64,
    /// Upper bound on cached responses.
    pub cache_capacity: u64,
    /// Longest accepted query, in characters.
    pub max_query_chars: usize,
    /// User-Agent sent upstream.
    pub user_agent: String,
    /// Cost-control ceilings.
    pub cost: CostConfig,
    /// Provider endpoints.
    pub endpoints: EndpointConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            providers: ProviderId::all().to_vec(),
            timeout_seconds: 10,
            max_results: 10,
            cache_ttl_seconds: 600,
            cache_capacity: 1_000,
            max_query_chars: 400,
            user_agent: concat!("geosearch/", env!("CARGO_PKG_VERSION")).to_owned(),
            cost: CostConfig::default(),
            endpoints: EndpointConfig::default(),
        }
    }
}

impl RouterConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `providers` must be non-empty and free of duplicates
    /// - `timeout_seconds`, `max_results` and `max_query_chars` must be greater than 0
    /// - `cost.rate_limit_window_seconds` and `cost.rate_limit_max_requests` must be greater than 0
    /// - every endpoint must be an absolute http(s) URL
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.providers.is_empty() {
            return Err(SearchError::Config(
                "at least one provider must be enabled".into(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.providers.iter().find(|p| !seen.insert(**p)) {
            return Err(SearchError::Config(format!(
                "provider {dup} listed more than once"
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.max_results == 0 {
            return Err(SearchError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.max_query_chars == 0 {
            return Err(SearchError::Config(
                "max_query_chars must be greater than 0".into(),
            ));
        }
        if self.cost.rate_limit_window_seconds == 0 {
            return Err(SearchError::Config(
                "cost.rate_limit_window_seconds must be greater than 0".into(),
            ));
        }
        if self.cost.rate_limit_max_requests == 0 {
            return Err(SearchError::Config(
                "cost.rate_limit_max_requests must be greater than 0".into(),
            ));
        }
        for provider in ProviderId::all() {
            let endpoint = self.endpoints.for_provider(*provider);
            let valid = url::Url::parse(endpoint)
                .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
                .unwrap_or(false);
            if !valid {
                return Err(SearchError::Config(format!(
                    "endpoints.{provider} is not an absolute http(s) URL: {endpoint}"
                )));
            }
        }
        Ok(())
    }
}
