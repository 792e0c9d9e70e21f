//! Brave Search API: independent index, explicit `ALL` worldwide route.
//!
//! GET with `q`, `count`, `country` and an optional `search_lang`; the key
//! travels in the `X-Subscription-Token` header.

use serde_json::Value;

use super::{collect, find_array, str_at, CallParams};
use crate::http::{HttpMethod, UpstreamRequest};
use crate::planner::ProviderAttempt;
use crate::types::{CanonicalResult, ProviderId};

/// Brave caps `count` at 20.
const MAX_COUNT: usize = 20;

pub(super) fn build_request(
    attempt: &ProviderAttempt,
    params: &CallParams<'_>,
    endpoint: &str,
) -> UpstreamRequest {
    let mut query = vec![
        ("q".to_owned(), params.query.to_owned()),
        (
            "count".to_owned(),
            params.max_results.min(MAX_COUNT).to_string(),
        ),
    ];
    if let Some(country) = &attempt.country_param {
        query.push(("country".to_owned(), country.clone()));
    }
    if let Some(lang) = params.language {
        query.push(("search_lang".to_owned(), lang.to_owned()));
    }

    UpstreamRequest {
        provider: ProviderId::Brave,
        method: HttpMethod::Get,
        url: endpoint.to_owned(),
        query,
        headers: vec![(
            "X-Subscription-Token".to_owned(),
            attempt.credential.clone(),
        )],
        json_body: None,
    }
}

pub(super) fn parse(root: &Value) -> Vec<CanonicalResult> {
    let Some(items) = find_array(root, &[&["web", "results"], &["results"]]) else {
        return Vec::new();
    };
    collect(items, |item| CanonicalResult {
        title: str_at(item, &["title"]).to_owned(),
        url: str_at(item, &["url"]).to_owned(),
        snippet: str_at(item, &["description"]).to_owned(),
        display_url: str_at(item, &["meta_url", "hostname"]).to_owned(),
    })
}
