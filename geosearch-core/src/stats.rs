//! Observational statistics over the final result set.
//!
//! Results are first [`annotate`]d with domain, TLD, ccTLD country and
//! language, then [`aggregate`]d into counts and four histograms. Nothing
//! here affects result order.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use url::Url;

use crate::country::CountryCode;
use crate::lang::LanguageDetector;
use crate::types::CanonicalResult;

/// Placeholder for fields that cannot be derived.
pub const UNKNOWN: &str = "unknown";

/// Derived fields for one result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Lowercase host without a leading `www.`.
    pub domain: String,
    /// Last label of the host.
    pub tld: String,
    /// Country implied by a ccTLD, or `"unknown"`.
    pub country: String,
    /// Detected language code.
    pub language: String,
}

/// Derive an [`Annotation`] for every result.
pub fn annotate(results: &[CanonicalResult], detector: &dyn LanguageDetector) -> Vec<Annotation> {
    results
        .iter()
        .map(|result| {
            let (domain, tld) = domain_and_tld(&result.url);
            let country = country_for_tld(&tld);
            let text = format!("{} {}", result.title, result.snippet);
            Annotation {
                domain,
                tld,
                country,
                language: detector.detect(&text),
            }
        })
        .collect()
}

fn domain_and_tld(raw: &str) -> (String, String) {
    let Ok(parsed) = Url::parse(raw.trim()) else {
        return (UNKNOWN.to_owned(), UNKNOWN.to_owned());
    };
    match (parsed.host_str(), parsed.domain()) {
        (_, Some(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            let domain = domain.strip_prefix("www.").unwrap_or(&domain).to_owned();
            let tld = domain
                .rsplit('.')
                .next()
                .filter(|label| !label.is_empty())
                .unwrap_or(UNKNOWN)
                .to_owned();
            (domain, tld)
        }
        // IP literal hosts have no TLD.
        (Some(host), None) => (host.to_owned(), UNKNOWN.to_owned()),
        (None, None) => (UNKNOWN.to_owned(), UNKNOWN.to_owned()),
    }
}

fn country_for_tld(tld: &str) -> String {
    if tld.len() != 2 {
        return UNKNOWN.to_owned();
    }
    if tld == "uk" {
        return "GB".to_owned();
    }
    CountryCode::parse(tld)
        .map(|code| code.as_str().to_owned())
        .unwrap_or_else(|| UNKNOWN.to_owned())
}

/// One histogram bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramRow {
    /// Bucket key.
    pub key: String,
    /// Results in the bucket.
    pub count: usize,
    /// Share of all results, one decimal place.
    pub percentage: f64,
}

/// Aggregated statistics for a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultStats {
    /// Number of results.
    pub total: usize,
    /// Distinct domains.
    pub distinct_domains: usize,
    /// Distinct TLDs.
    pub distinct_tlds: usize,
    /// Distinct inferred countries, excluding `"unknown"`.
    pub distinct_countries: usize,
    /// Results per TLD.
    pub by_tld: Vec<HistogramRow>,
    /// Results per inferred country.
    pub by_country: Vec<HistogramRow>,
    /// Results per detected language.
    pub by_language: Vec<HistogramRow>,
    /// Results per domain.
    pub by_domain: Vec<HistogramRow>,
}

/// Compute counts and histograms over annotated results.
pub fn aggregate(annotations: &[Annotation]) -> ResultStats {
    let total = annotations.len();

    ResultStats {
        total,
        distinct_domains: distinct(annotations, |a| a.domain.as_str()).len(),
        distinct_tlds: distinct(annotations, |a| a.tld.as_str()).len(),
        distinct_countries: distinct(annotations, |a| a.country.as_str())
            .into_iter()
            .filter(|country| *country != UNKNOWN)
            .count(),
        by_tld: histogram(annotations.iter().map(|a| a.tld.as_str()), total),
        by_country: histogram(annotations.iter().map(|a| a.country.as_str()), total),
        by_language: histogram(annotations.iter().map(|a| a.language.as_str()), total),
        by_domain: histogram(annotations.iter().map(|a| a.domain.as_str()), total),
    }
}

fn distinct<'a>(
    annotations: &'a [Annotation],
    field: impl Fn(&'a Annotation) -> &'a str,
) -> BTreeSet<&'a str> {
    annotations.iter().map(field).collect()
}

/// Count keys; rows sorted by count descending, then key ascending.
fn histogram<'a>(keys: impl Iterator<Item = &'a str>, total: usize) -> Vec<HistogramRow> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    let mut rows: Vec<HistogramRow> = counts
        .into_iter()
        .map(|(key, count)| HistogramRow {
            key: key.to_owned(),
            count,
            percentage: percentage(count, total),
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    rows
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}
