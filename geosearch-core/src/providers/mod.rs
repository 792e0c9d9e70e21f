//! Provider request builders and response parsers.
//!
//! Each provider module knows two things: how to turn a planned attempt
//! into an [`UpstreamRequest`], and how to read that provider's JSON into
//! [`CanonicalResult`] records. Dispatch is a plain `match` on
//! [`ProviderId`], so the set of strategies is closed.

pub mod brave;
pub mod mojeek;
pub mod serper;

use serde_json::Value;

use crate::config::EndpointConfig;
use crate::error::UpstreamError;
use crate::http::UpstreamRequest;
use crate::planner::ProviderAttempt;
use crate::types::{CanonicalResult, ProviderId};

/// The body could not be read as a provider payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ParseError(pub String);

impl From<ParseError> for UpstreamError {
    fn from(err: ParseError) -> Self {
        UpstreamError::Parse(err.0)
    }
}

/// Request-level inputs shared by every attempt of a walk.
#[derive(Debug, Clone, Copy)]
pub struct CallParams<'a> {
    /// Normalised query text.
    pub query: &'a str,
    /// Optional lowercase language hint.
    pub language: Option<&'a str>,
    /// Number of results to ask for.
    pub max_results: usize,
}

/// Describe the upstream call for `attempt`.
pub fn build_request(
    attempt: &ProviderAttempt,
    params: &CallParams<'_>,
    endpoints: &EndpointConfig,
) -> UpstreamRequest {
    let endpoint = endpoints.for_provider(attempt.provider);
    match attempt.provider {
        ProviderId::Brave => brave::build_request(attempt, params, endpoint),
        ProviderId::Serper => serper::build_request(attempt, params, endpoint),
        ProviderId::Mojeek => mojeek::build_request(attempt, params, endpoint),
    }
}

/// Parse a raw response body from `provider`.
///
/// A well-formed JSON object without a result container yields an empty
/// list. Bodies that are not JSON, or JSON that is not an object, are
/// parse errors.
///
/// # Errors
///
/// Returns [`ParseError`] when the body is not a JSON object.
pub fn parse_response(provider: ProviderId, body: &str) -> Result<Vec<CanonicalResult>, ParseError> {
    let root: Value = serde_json::from_str(body)
        .map_err(|e| ParseError(format!("{provider} response is not JSON: {e}")))?;
    if !root.is_object() {
        return Err(ParseError(format!(
            "{provider} response is not a JSON object"
        )));
    }
    let results = match provider {
        ProviderId::Brave => brave::parse(&root),
        ProviderId::Serper => serper::parse(&root),
        ProviderId::Mojeek => mojeek::parse(&root),
    };
    Ok(results)
}

/// First array found at any of the given paths.
fn find_array<'a>(root: &'a Value, paths: &[&[&str]]) -> Option<&'a Vec<Value>> {
    paths.iter().find_map(|path| {
        path.iter()
            .try_fold(root, |node, key| node.get(key))
            .and_then(Value::as_array)
    })
}

/// String at `path`, or `""` when absent or not a string.
fn str_at<'a>(item: &'a Value, path: &[&str]) -> &'a str {
    path.iter()
        .try_fold(item, |node, key| node.get(key))
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// Collect canonical records, dropping entries without a URL.
fn collect(items: &[Value], read: impl Fn(&Value) -> CanonicalResult) -> Vec<CanonicalResult> {
    items
        .iter()
        .map(read)
        .filter(|result| !result.url.trim().is_empty())
        .collect()
}
