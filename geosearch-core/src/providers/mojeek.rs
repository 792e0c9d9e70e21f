//! Mojeek: independent index with region and language boosts.
//!
//! GET with `q`, `fmt=json`, `t` (result count), `rb` (region boost) and
//! `lb` (language boost). The key travels as the `api_key` query
//! parameter. Mojeek spells Great Britain `uk`.

use serde_json::Value;

use super::{collect, find_array, str_at, CallParams};
use crate::http::{HttpMethod, UpstreamRequest};
use crate::planner::ProviderAttempt;
use crate::types::{CanonicalResult, ProviderId};

const MAX_T: usize = 100;

pub(super) fn build_request(
    attempt: &ProviderAttempt,
    params: &CallParams<'_>,
    endpoint: &str,
) -> UpstreamRequest {
    let mut query = vec![
        ("q".to_owned(), params.query.to_owned()),
        ("fmt".to_owned(), "json".to_owned()),
        ("t".to_owned(), params.max_results.min(MAX_T).to_string()),
        ("api_key".to_owned(), attempt.credential.clone()),
    ];
    if let Some(region) = &attempt.country_param {
        query.push(("rb".to_owned(), region.clone()));
    }
    if let Some(lang) = params.language {
        query.push(("lb".to_owned(), lang.to_owned()));
    }

    UpstreamRequest {
        provider: ProviderId::Mojeek,
        method: HttpMethod::Get,
        url: endpoint.to_owned(),
        query,
        headers: Vec::new(),
        json_body: None,
    }
}

pub(super) fn parse(root: &Value) -> Vec<CanonicalResult> {
    let Some(items) = find_array(root, &[&["response", "results"], &["results"]]) else {
        return Vec::new();
    };
    collect(items, |item| CanonicalResult {
        title: str_at(item, &["title"]).to_owned(),
        url: str_at(item, &["url"]).to_owned(),
        snippet: str_at(item, &["desc"]).to_owned(),
        display_url: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country::CountryCode;
    use crate::coverage;
    use crate::planner::CountryResolution;
    use crate::providers::parse_response;
    use crate::types::CredentialSource;

    #[test]
    fn request_uses_uk_for_great_britain() {
        let gb = CountryCode::parse("GB").expect("GB");
        let attempt = ProviderAttempt {
            provider: ProviderId::Mojeek,
            credential: "mojeek-key".into(),
            credential_source: CredentialSource::User,
            requested_country: Some(gb),
            resolved_country: Some(gb),
            country_param: Some(coverage::country_param(ProviderId::Mojeek, gb)),
            resolution: CountryResolution::Exact,
            reason: "test".into(),
        };
        let params = CallParams {
            query: "tea",
            language: Some("en"),
            max_results: 10,
        };
        let request = build_request(&attempt, &params, "https://mojeek.test/search");
        assert_eq!(request.query_param("rb"), Some("uk"));
        assert_eq!(request.query_param("lb"), Some("en"));
        assert_eq!(request.query_param("fmt"), Some("json"));
        assert_eq!(request.query_param("api_key"), Some("mojeek-key"));
        assert!(request.headers.is_empty());
    }

    #[test]
    fn parses_response_results() {
        let body = r#"{"response": {"status": "OK", "results": [
            {"title": "Tea", "url": "https://tea.example/", "desc": "hot drink"},
            {"title": "Broken", "url": 42}
        ]}}"#;
        let results = parse_response(ProviderId::Mojeek, body).expect("parse");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].snippet, "hot drink");
        assert_eq!(results[0].display_url, "");
    }

    #[test]
    fn accepts_top_level_results() {
        let body = r#"{"results": [{"title": "T", "url": "https://t.example/"}]}"#;
        let results = parse_response(ProviderId::Mojeek, body).expect("parse");
        assert_eq!(results.len(), 1);
    }
}
