//! Request pipeline: validate, gate, plan, execute, dedup, annotate.
//!
//! # Pipeline
//!
//! 1. Reject empty or oversized queries and unknown country codes
//! 2. Admit the client identity through the rate limiter
//! 3. Require at least one usable credential for a configured provider
//! 4. Plan attempts; with `strict_country`, require a targeted attempt
//! 5. Serve a cached response when one exists
//! 6. Walk the plan until the first success
//! 7. Deduplicate, annotate and aggregate statistics
//! 8. Cache the response iff the winning credential was server-owned

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheKey, ResponseCache};
use crate::config::RouterConfig;
use crate::cost::CostControl;
use crate::country::CountryCode;
use crate::error::{Result, SearchError};
use crate::http::{HttpTransport, UpstreamTransport};
use crate::lang::{LanguageDetector, ScriptDetector};
use crate::planner::{self, ProviderAttempt};
use crate::providers::CallParams;
use crate::stats::{self, ResultStats};
use crate::types::{CanonicalResult, CredentialSource, Credentials};

use super::dedup::dedup;
use super::executor::{AttemptExecutor, AttemptRecord, SelectedRoute};

/// One inbound search.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    /// Free-text query.
    pub query: String,
    /// ISO 3166-1 alpha-2 code to target, any case.
    pub country_hint: Option<String>,
    /// Preferred result language, e.g. `"fr"` or `"pt-BR"`.
    pub language_hint: Option<String>,
    /// Rate-limit identity, usually the client IP.
    pub client_identity: String,
    /// Keys available to this request.
    pub credentials: Credentials,
    /// Fail with `no_route` instead of falling back to worldwide results.
    pub strict_country: bool,
}

/// A successful search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Deduplicated results in upstream order.
    pub results: Vec<CanonicalResult>,
    /// Every attempt considered, winner last.
    pub attempt_trace: Vec<AttemptRecord>,
    /// The winning attempt.
    pub selected: Option<SelectedRoute>,
    /// Duplicates removed from the upstream result list.
    pub deduped_count: usize,
    /// Statistics over `results`.
    pub stats: ResultStats,
    /// Whether a shared cache may store this response.
    pub cacheable: bool,
    /// Whether this response was served from the router's cache.
    pub cache_hit: bool,
}

/// Routes searches to providers. Share one instance per process.
pub struct SearchRouter<T = HttpTransport> {
    config: RouterConfig,
    transport: T,
    cost: Arc<CostControl>,
    cache: ResponseCache,
    detector: Arc<dyn LanguageDetector>,
}

impl SearchRouter<HttpTransport> {
    /// Build a router that talks to the real provider APIs.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for invalid config or
    /// [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: RouterConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        let cost = Arc::new(CostControl::with_system_clock(&config.cost));
        Self::with_parts(config, transport, cost)
    }
}

impl<T: UpstreamTransport> SearchRouter<T> {
    /// Build a router from explicit parts.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` is invalid.
    pub fn with_parts(config: RouterConfig, transport: T, cost: Arc<CostControl>) -> Result<Self> {
        config.validate()?;
        let cache = ResponseCache::new(config.cache_ttl_seconds, config.cache_capacity);
        Ok(Self {
            config,
            transport,
            cost,
            cache,
            detector: Arc::new(ScriptDetector),
        })
    }

    /// Replace the language detector used for statistics.
    #[must_use]
    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Router configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Shared cost-control state.
    pub fn cost(&self) -> &Arc<CostControl> {
        &self.cost
    }

    /// Plan attempts for `country` with the configured provider priority.
    pub fn plan(&self, country: Option<CountryCode>, credentials: &Credentials) -> Vec<ProviderAttempt> {
        planner::plan_attempts(country, credentials, &self.config.providers)
    }

    /// Run one search through the full pipeline.
    ///
    /// # Errors
    ///
    /// Returns a [`SearchError`] whose [`SearchError::reason`] tells the
    /// caller whether the request was invalid, refused by policy, or
    /// exhausted every planned attempt.
    pub async fn search(&self, request: SearchRequest) -> Result<SearchResponse> {
        let query = self.validate_query(&request.query)?;
        let country = parse_country_hint(request.country_hint.as_deref())?;
        let language = normalize_language(request.language_hint.as_deref());
        tracing::trace!(query, "search requested");

        self.cost.check_rate(&request.client_identity)?;

        if !request.credentials.any_for(&self.config.providers) {
            return Err(SearchError::NoCredentials);
        }

        let plan = self.plan(country, &request.credentials);
        if let Some(country) = country {
            if request.strict_country && !planner::has_targeted_attempt(&plan) {
                return Err(SearchError::NoRoute(country.to_string()));
            }
        }

        let key = CacheKey::new(query, country, language.as_deref());
        if let Some(mut cached) = self.cache.get(&key).await {
            tracing::debug!(country = ?country, "serving cached response");
            cached.cache_hit = true;
            return Ok(cached);
        }

        let params = CallParams {
            query,
            language: language.as_deref(),
            max_results: self.config.max_results,
        };
        let executor = AttemptExecutor::new(
            &self.transport,
            &self.cost,
            &self.config.endpoints,
            Duration::from_secs(self.config.timeout_seconds),
        );
        let execution = executor.execute(&plan, &params).await?;

        let deduped = dedup(execution.results);
        let annotations = stats::annotate(&deduped.results, self.detector.as_ref());
        let cacheable = execution.selected.credential_source == CredentialSource::Server;

        tracing::info!(
            provider = %execution.selected.provider,
            resolution = %execution.selected.resolution,
            attempts = execution.trace.len(),
            results = deduped.results.len(),
            dropped = deduped.dropped,
            cacheable,
            "search completed"
        );

        let response = SearchResponse {
            stats: stats::aggregate(&annotations),
            results: deduped.results,
            attempt_trace: execution.trace,
            selected: Some(execution.selected),
            deduped_count: deduped.dropped,
            cacheable,
            cache_hit: false,
        };
        if cacheable {
            self.cache.insert(key, response.clone()).await;
        }
        Ok(response)
    }

    fn validate_query<'q>(&self, raw: &'q str) -> Result<&'q str> {
        let query = raw.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidInput("query must not be empty".into()));
        }
        let chars = query.chars().count();
        if chars > self.config.max_query_chars {
            return Err(SearchError::InvalidInput(format!(
                "query is {chars} characters; the limit is {}",
                self.config.max_query_chars
            )));
        }
        Ok(query)
    }
}

impl<T> std::fmt::Debug for SearchRouter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchRouter")
            .field("config", &self.config)
            .field("cost", &self.cost)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Blank hints mean "no country"; anything else must be a known code.
fn parse_country_hint(hint: Option<&str>) -> Result<Option<CountryCode>> {
    match hint.map(str::trim).filter(|h| !h.is_empty()) {
        None => Ok(None),
        Some(raw) => CountryCode::parse(raw)
            .map(Some)
            .ok_or_else(|| SearchError::InvalidInput(format!("unknown country code: {raw}"))),
    }
}

/// Primary subtag of a language hint, lowercased; unusable hints are dropped.
fn normalize_language(hint: Option<&str>) -> Option<String> {
    let primary = hint?.trim().split(['-', '_']).next()?.to_ascii_lowercase();
    if (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_lowercase()) {
        Some(primary)
    } else {
        tracing::debug!(hint = ?hint, "ignoring unusable language hint");
        None
    }
}
