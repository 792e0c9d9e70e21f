//! URL canonicalisation for result deduplication.
//!
//! Canonicalises URLs so that equivalent pages (differing only in host
//! capitalisation, query-parameter order, tracking parameters or
//! fragments) compare as equal.

use url::{form_urlencoded, Url};

/// Tracking query parameters that are stripped during canonicalisation.
///
/// Any key starting with `utm_` is stripped as well.
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "dclid", "msclkid", "yclid", "mc_cid", "mc_eid", "igshid", "_ga", "_gl",
    "ref_src",
];

/// Canonicalise a URL for deduplication comparison.
///
/// Applies the following transformations:
///
/// 1. Lowercase the host, for any scheme.
/// 2. Remove the fragment (`#…`).
/// 3. Strip `utm_*` and known click-id parameters, matching keys
///    case-insensitively.
/// 4. Sort remaining query parameters by their raw `(key, value)` text.
///    Percent-escapes are kept as written, so distinct byte sequences
///    never collapse into one.
///
/// Input that is not an absolute URL with a host is returned trimmed but
/// otherwise unchanged. The function is idempotent.
///
/// # Examples
///
/// ```
/// use geosearch_core::orchestrator::canonical::canonicalize;
///
/// assert_eq!(
///     canonicalize("https://Example.com/path?utm_source=x&b=2&a=1#frag"),
///     "https://example.com/path?a=1&b=2"
/// );
/// ```
pub fn canonicalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut parsed) = Url::parse(trimmed) else {
        return trimmed.to_owned();
    };
    if parsed.host_str().is_none() {
        return trimmed.to_owned();
    }

    parsed.set_fragment(None);

    // Non-special schemes keep the host's case through parsing.
    if let Some(host) = parsed.host_str().map(str::to_ascii_lowercase) {
        if parsed.set_host(Some(&host)).is_err() {
            return trimmed.to_owned();
        }
    }

    if let Some(query) = parsed.query().map(canonical_query) {
        parsed.set_query(query.as_deref());
    }

    parsed.to_string()
}

/// Filter and sort raw `&`-separated pairs, leaving their encoding intact.
///
/// Returns `None` when no pair survives.
fn canonical_query(query: &str) -> Option<String> {
    let mut pairs: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty() && !is_tracking_pair(pair))
        .collect();
    if pairs.is_empty() {
        return None;
    }
    pairs.sort_by(|a, b| split_pair(a).cmp(&split_pair(b)));
    Some(pairs.join("&"))
}

fn split_pair(pair: &str) -> (&str, &str) {
    pair.split_once('=').unwrap_or((pair, ""))
}

fn is_tracking_pair(pair: &str) -> bool {
    form_urlencoded::parse(pair.as_bytes())
        .next()
        .is_some_and(|(key, _)| is_tracking_param(&key))
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key.as_str())
}
