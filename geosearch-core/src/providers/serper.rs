//! Serper: Google results over a JSON API, the widest country coverage.
//!
//! POST a JSON body `{q, num, gl?, hl?}` with the key in `X-API-KEY`.
//! Worldwide routes simply omit `gl`.

use serde_json::{Map, Value};

use super::{collect, find_array, str_at, CallParams};
use crate::http::{HttpMethod, UpstreamRequest};
use crate::planner::ProviderAttempt;
use crate::types::{CanonicalResult, ProviderId};

const MAX_NUM: usize = 100;

pub(super) fn build_request(
    attempt: &ProviderAttempt,
    params: &CallParams<'_>,
    endpoint: &str,
) -> UpstreamRequest {
    let mut body = Map::new();
    body.insert("q".into(), Value::from(params.query));
    body.insert("num".into(), Value::from(params.max_results.min(MAX_NUM)));
    if let Some(country) = &attempt.country_param {
        body.insert("gl".into(), Value::from(country.as_str()));
    }
    if let Some(lang) = params.language {
        body.insert("hl".into(), Value::from(lang));
    }

    UpstreamRequest {
        provider: ProviderId::Serper,
        method: HttpMethod::Post,
        url: endpoint.to_owned(),
        query: Vec::new(),
        headers: vec![("X-API-KEY".to_owned(), attempt.credential.clone())],
        json_body: Some(Value::Object(body)),
    }
}

pub(super) fn parse(root: &Value) -> Vec<CanonicalResult> {
    let Some(items) = find_array(root, &[&["organic"], &["organic_results"]]) else {
        return Vec::new();
    };
    collect(items, |item| {
        let display = match str_at(item, &["displayLink"]) {
            "" => str_at(item, &["displayed_link"]),
            display => display,
        };
        CanonicalResult {
            title: str_at(item, &["title"]).to_owned(),
            url: str_at(item, &["link"]).to_owned(),
            snippet: str_at(item, &["snippet"]).to_owned(),
            display_url: display.to_owned(),
        }
    })
}
