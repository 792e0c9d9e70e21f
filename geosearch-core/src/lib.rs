//! # geosearch-core
//!
//! Country-targeted search routing across independent upstream providers.
//!
//! A request names a query and, optionally, a country. The router works
//! out which providers can target that country natively, which can only
//! approximate it through a neighbouring substitute, and which can only
//! search worldwide. It then tries those routes in a fixed order until
//! one answers.
//!
//! ## Design
//!
//! - Static per-provider coverage tables ([`coverage`]) drive a
//!   deterministic attempt plan ([`planner`]): exact, then proxy, then
//!   global, user credentials before server credentials
//! - Attempts run strictly one at a time with a per-call timeout; the first
//!   well-formed response wins ([`orchestrator::executor`])
//! - Each provider's JSON is parsed by its own strategy ([`providers`])
//! - Results are deduplicated by canonical URL without re-ordering
//!   ([`orchestrator::dedup`]) and summarised into histograms ([`stats`])
//! - A per-identity rate limiter and a daily budget for server-owned
//!   credentials gate upstream usage ([`cost`])
//!
//! ## Security
//!
//! - Credentials are redacted from `Debug` output, errors and logs
//! - Search queries are logged only at trace level
//! - Responses produced with a user's own credential are never cached

pub mod cache;
pub mod config;
pub mod cost;
pub mod country;
pub mod coverage;
pub mod error;
pub mod http;
pub mod lang;
pub mod orchestrator;
pub mod planner;
pub mod providers;
pub mod stats;
pub mod types;

pub use config::{CostConfig, EndpointConfig, RouterConfig};
pub use cost::CostControl;
pub use country::CountryCode;
pub use error::{FailureReason, FailureReport, Result, SearchError, UpstreamError};
pub use orchestrator::executor::{AttemptOutcome, AttemptRecord, SelectedRoute};
pub use orchestrator::router::{SearchRequest, SearchResponse, SearchRouter};
pub use planner::{CountryResolution, PlannedAttempt, ProviderAttempt};
pub use types::{CanonicalResult, CredentialSource, Credentials, ProviderId};

/// Search with a router built from `config`.
///
/// Convenience wrapper for one-shot callers; long-running services should
/// build one [`SearchRouter`] and share it, since rate limits, the daily
/// budget and the cache live inside it.
///
/// # Errors
///
/// Returns [`SearchError::Config`] for invalid config, otherwise the same
/// errors as [`SearchRouter::search`].
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> geosearch_core::Result<()> {
/// use geosearch_core::{Credentials, ProviderId, RouterConfig, SearchRequest};
///
/// let request = SearchRequest {
///     query: "boulangerie".into(),
///     country_hint: Some("FR".into()),
///     credentials: Credentials::default().with_user(ProviderId::Brave, "my-key"),
///     ..Default::default()
/// };
/// let response = geosearch_core::search(request, RouterConfig::default()).await?;
/// for result in &response.results {
///     println!("{}: {}", result.title, result.url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search(request: SearchRequest, config: RouterConfig) -> Result<SearchResponse> {
    SearchRouter::new(config)?.search(request).await
}
