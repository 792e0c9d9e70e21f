//! Stable result deduplication by canonical URL.
//!
//! A single left-to-right pass: the first result for each canonical URL
//! wins and keeps its original URL string; later ones are dropped.
//! Results with a blank URL are never treated as duplicates.

use std::collections::HashSet;

use crate::types::CanonicalResult;

use super::canonical::canonicalize;

/// Output of [`dedup`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Deduplicated {
    /// Surviving results, in input order.
    pub results: Vec<CanonicalResult>,
    /// How many results were dropped as duplicates.
    pub dropped: usize,
}

/// Remove results whose canonical URL was already seen.
///
/// Order-preserving and idempotent.
pub fn dedup(results: Vec<CanonicalResult>) -> Deduplicated {
    let total = results.len();
    let mut seen = HashSet::with_capacity(total);
    let kept: Vec<CanonicalResult> = results
        .into_iter()
        .filter(|result| {
            let url = result.url.trim();
            if url.is_empty() {
                return true;
            }
            let key = match canonicalize(url) {
                key if key.is_empty() => url.to_owned(),
                key => key,
            };
            seen.insert(key)
        })
        .collect();

    Deduplicated {
        dropped: total - kept.len(),
        results: kept,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(url: &str) -> CanonicalResult {
        CanonicalResult {
            title: format!("title for {url}"),
            url: url.into(),
            ..Default::default()
        }
    }

    fn urls(results: &[CanonicalResult]) -> Vec<&str> {
        results.iter().map(|r| r.url.as_str()).collect()
    }

    #[test]
    fn three_item_example() {
        let out = dedup(vec![
            result("https://x.com/a?utm_source=1"),
            result("https://X.com/a"),
            result("https://x.com/b"),
        ]);
        assert_eq!(urls(&out.results), vec!["https://x.com/a?utm_source=1", "https://x.com/b"]);
        assert_eq!(out.dropped, 1);
    }

    #[test]
    fn empty_urls_are_always_kept() {
        let out = dedup(vec![result(""), result("   "), result("")]);
        assert_eq!(out.results.len(), 3);
        assert_eq!(out.dropped, 0);
    }

    #[test]
    fn first_occurrence_wins_with_its_fields() {
        let mut first = result("https://a.example/p#one");
        first.snippet = "first".into();
        let mut second = result("https://a.example/p#two");
        second.snippet = "second".into();
        let out = dedup(vec![first, second]);
        assert_eq!(out.results.len(), 1);
        assert_eq!(out.results[0].snippet, "first");
    }

    #[test]
    fn distinct_undecodable_queries_are_both_kept() {
        let out = dedup(vec![result("https://x.com/?q=%FF"), result("https://x.com/?q=%FE")]);
        assert_eq!(out.results.len(), 2);
        assert_eq!(out.dropped, 0);
    }

    #[test]
    fn unparseable_urls_dedup_on_trimmed_text() {
        let out = dedup(vec![result("not a url"), result(" not a url "), result("other")]);
        assert_eq!(urls(&out.results), vec!["not a url", "other"]);
    }

    #[test]
    fn order_preserving_and_idempotent() {
        let input = vec![
            result("https://c.example/"),
            result("https://a.example/?b=1&a=2"),
            result(""),
            result("https://C.example/"),
            result("https://a.example/?a=2&b=1"),
            result("https://b.example/"),
        ];
        let once = dedup(input);
        assert_eq!(
            urls(&once.results),
            vec![
                "https://c.example/",
                "https://a.example/?b=1&a=2",
                "",
                "https://b.example/"
            ]
        );
        assert_eq!(once.dropped, 2);

        let twice = dedup(once.results.clone());
        assert_eq!(twice.results, once.results);
        assert_eq!(twice.dropped, 0);
    }

    #[test]
    fn empty_input() {
        assert_eq!(dedup(Vec::new()), Deduplicated::default());
    }
}
