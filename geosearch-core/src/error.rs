//! Error types for the geosearch-core crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. No credentials or sensitive data appear in
//! error messages.
//!
//! Two layers exist:
//!
//! - [`UpstreamError`] describes why a single provider attempt failed. It is
//!   recorded in the attempt trace and never aborts a request on its own.
//! - [`SearchError`] is the request-level failure surfaced to callers. Each
//!   variant maps onto a machine-readable [`FailureReason`].

use serde::{Deserialize, Serialize};

use crate::cost::RateLimitError;
use crate::orchestrator::executor::AttemptRecord;

/// Why a single upstream call failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// The call did not complete within the per-call timeout.
    #[error("upstream timed out after {0}ms")]
    Timeout(u64),

    /// The request could not be sent or the connection failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-success HTTP status.
    #[error("upstream returned HTTP {0}")]
    Status(u16),

    /// The response body was not a parseable provider payload.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Machine-readable failure codes returned to the calling layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Missing or invalid query / country code.
    InvalidInput,
    /// Per-identity request ceiling reached.
    RateLimited,
    /// No provider has a usable credential.
    NoCredentials,
    /// The country could not be targeted and targeting was required.
    NoRoute,
    /// Every planned attempt was skipped because the daily budget ran out.
    BudgetExhausted,
    /// Every planned attempt failed or was skipped.
    AllAttemptsFailed,
}

impl FailureReason {
    /// Stable wire code for this reason.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::RateLimited => "rate_limited",
            Self::NoCredentials => "no_credentials",
            Self::NoRoute => "no_route",
            Self::BudgetExhausted => "budget_exhausted",
            Self::AllAttemptsFailed => "all_attempts_failed",
        }
    }
}

/// Errors that can occur while routing a search request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    /// The request was rejected before any policy check.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The client identity exceeded its request ceiling.
    #[error("rate limit exceeded; retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until the oldest request in the window expires.
        retry_after_secs: u64,
    },

    /// No user or server credential is available for any provider.
    #[error("no credentials configured for any provider")]
    NoCredentials,

    /// Country targeting was required but no provider can target the country.
    #[error("no targeted route for country {0}")]
    NoRoute(String),

    /// All attempts were skipped because the daily miss budget is spent.
    #[error("daily upstream budget exhausted ({} attempts skipped)", trace.len())]
    BudgetExhausted {
        /// Every attempt that was considered.
        trace: Vec<AttemptRecord>,
    },

    /// Every planned attempt failed or was skipped.
    #[error("all provider attempts failed: {}", summarize(trace))]
    AllAttemptsFailed {
        /// Every attempt that was considered, in plan order.
        trace: Vec<AttemptRecord>,
    },

    /// Invalid router configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP error: {0}")]
    Http(String),
}

impl SearchError {
    /// Machine-readable reason, if this error is a request outcome.
    ///
    /// Configuration and client-construction errors are operator problems
    /// and carry no request reason.
    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            Self::InvalidInput(_) => Some(FailureReason::InvalidInput),
            Self::RateLimited { .. } => Some(FailureReason::RateLimited),
            Self::NoCredentials => Some(FailureReason::NoCredentials),
            Self::NoRoute(_) => Some(FailureReason::NoRoute),
            Self::BudgetExhausted { .. } => Some(FailureReason::BudgetExhausted),
            Self::AllAttemptsFailed { .. } => Some(FailureReason::AllAttemptsFailed),
            Self::Config(_) | Self::Http(_) => None,
        }
    }

    /// The attempt trace accumulated before the failure (empty for policy errors).
    pub fn trace(&self) -> &[AttemptRecord] {
        match self {
            Self::BudgetExhausted { trace } | Self::AllAttemptsFailed { trace } => trace,
            _ => &[],
        }
    }

    /// Retry-after hint in seconds, only set for rate limiting.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

impl From<RateLimitError> for SearchError {
    fn from(err: RateLimitError) -> Self {
        match err {
            RateLimitError::Exceeded { retry_after_secs } => Self::RateLimited { retry_after_secs },
        }
    }
}

fn summarize(trace: &[AttemptRecord]) -> String {
    if trace.is_empty() {
        return "no attempts planned".to_owned();
    }
    trace
        .iter()
        .map(|record| {
            format!(
                "{}/{}/{}: {}",
                record.provider,
                record.credential_source,
                record.resolution,
                record.outcome.status()
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Serializable projection of a [`SearchError`] for the calling layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureReport {
    /// Machine-readable reason; `None` for operator errors.
    pub reason: Option<FailureReason>,
    /// Human-readable message.
    pub message: String,
    /// Full attempt trace for diagnosis.
    pub attempt_trace: Vec<AttemptRecord>,
    /// Seconds to wait before retrying (rate limiting only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl From<&SearchError> for FailureReport {
    fn from(err: &SearchError) -> Self {
        Self {
            reason: err.reason(),
            message: err.to_string(),
            attempt_trace: err.trace().to_vec(),
            retry_after_secs: err.retry_after_secs(),
        }
    }
}

/// Convenience type alias for geosearch-core results.
pub type Result<T> = std::result::Result<T, SearchError>;
