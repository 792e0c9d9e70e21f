//! Core types for provider identification, credentials and normalised results.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single normalised search result, independent of the upstream shape.
///
/// Every field is always present; fields the provider did not supply are
/// empty strings. Parsers never emit a record with an empty `url`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CanonicalResult {
    /// The title of the result page.
    pub title: String,
    /// The URL of the result, verbatim from upstream.
    pub url: String,
    /// A text snippet summarising the page content.
    pub snippet: String,
    /// Short display form of the URL as supplied by the provider.
    pub display_url: String,
}

/// Upstream search providers that geosearch can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Brave Search API: independent index, explicit `ALL` country route.
    Brave,
    /// Serper: Google results over a JSON API, widest country coverage.
    Serper,
    /// Mojeek: independent index with a small set of regional boosts.
    Mojeek,
}

impl ProviderId {
    /// Returns the human-readable name of this provider.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Brave => "Brave",
            Self::Serper => "Serper",
            Self::Mojeek => "Mojeek",
        }
    }

    /// Returns the stable lowercase identifier used in config and traces.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brave => "brave",
            Self::Serper => "serper",
            Self::Mojeek => "mojeek",
        }
    }

    /// Returns all providers in the default priority order.
    pub fn all() -> &'static [ProviderId] {
        &[Self::Brave, Self::Serper, Self::Mojeek]
    }

    /// Parse a provider from its identifier, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "brave" => Some(Self::Brave),
            "serper" => Some(Self::Serper),
            "mojeek" => Some(Self::Mojeek),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who owns the credential used for an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    /// Supplied by the end user for this request only.
    User,
    /// Owned by the operator; consumes the daily miss budget.
    Server,
}

impl CredentialSource {
    /// Stable lowercase identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Server => "server",
        }
    }
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API keys available to a request, split by owner.
///
/// Blank keys are treated as absent everywhere.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Keys supplied by the user for this request.
    pub user: HashMap<ProviderId, String>,
    /// Keys owned by the operator.
    pub server: HashMap<ProviderId, String>,
}

impl Credentials {
    /// Look up a usable key for `provider` from `source`.
    pub fn get(&self, provider: ProviderId, source: CredentialSource) -> Option<&str> {
        let map = match source {
            CredentialSource::User => &self.user,
            CredentialSource::Server => &self.server,
        };
        map.get(&provider)
            .map(|key| key.trim())
            .filter(|key| !key.is_empty())
    }

    /// Usable keys for `provider`, user key first.
    pub fn ordered_for(&self, provider: ProviderId) -> Vec<(CredentialSource, &str)> {
        [CredentialSource::User, CredentialSource::Server]
            .into_iter()
            .filter_map(|source| self.get(provider, source).map(|key| (source, key)))
            .collect()
    }

    /// Returns `true` if any of `providers` has at least one usable key.
    pub fn any_for(&self, providers: &[ProviderId]) -> bool {
        providers
            .iter()
            .any(|provider| !self.ordered_for(*provider).is_empty())
    }

    /// Builder-style helper: add a user key.
    pub fn with_user(mut self, provider: ProviderId, key: impl Into<String>) -> Self {
        self.user.insert(provider, key.into());
        self
    }

    /// Builder-style helper: add a server key.
    pub fn with_server(mut self, provider: ProviderId, key: impl Into<String>) -> Self {
        self.server.insert(provider, key.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut user: Vec<_> = self.user.keys().collect();
        let mut server: Vec<_> = self.server.keys().collect();
        user.sort();
        server.sort();
        f.debug_struct("Credentials")
            .field("user", &user)
            .field("server", &server)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_display_is_lowercase_id() {
        assert_eq!(ProviderId::Brave.to_string(), "brave");
        assert_eq!(ProviderId::Serper.to_string(), "serper");
        assert_eq!(ProviderId::Mojeek.to_string(), "mojeek");
        assert_eq!(ProviderId::Serper.name(), "Serper");
    }

    #[test]
    fn provider_parse_is_case_insensitive() {
        assert_eq!(ProviderId::parse("BRAVE"), Some(ProviderId::Brave));
        assert_eq!(ProviderId::parse(" mojeek "), Some(ProviderId::Mojeek));
        assert_eq!(ProviderId::parse("google"), None);
    }

    #[test]
    fn provider_all_is_default_priority() {
        assert_eq!(
            ProviderId::all(),
            &[ProviderId::Brave, ProviderId::Serper, ProviderId::Mojeek]
        );
    }

    #[test]
    fn provider_serde_uses_lowercase() {
        let json = serde_json::to_string(&ProviderId::Serper).expect("serialize");
        assert_eq!(json, "\"serper\"");
        let decoded: ProviderId = serde_json::from_str("\"mojeek\"").expect("deserialize");
        assert_eq!(decoded, ProviderId::Mojeek);
    }

    #[test]
    fn blank_credentials_are_absent() {
        let creds = Credentials::default()
            .with_user(ProviderId::Brave, "   ")
            .with_server(ProviderId::Brave, "server-key");
        assert_eq!(creds.get(ProviderId::Brave, CredentialSource::User), None);
        assert_eq!(
            creds.get(ProviderId::Brave, CredentialSource::Server),
            Some("server-key")
        );
    }

    #[test]
    fn ordered_for_puts_user_first() {
        let creds = Credentials::default()
            .with_server(ProviderId::Serper, "s")
            .with_user(ProviderId::Serper, "u");
        let ordered = creds.ordered_for(ProviderId::Serper);
        assert_eq!(
            ordered,
            vec![(CredentialSource::User, "u"), (CredentialSource::Server, "s")]
        );
    }

    #[test]
    fn any_for_respects_provider_subset() {
        let creds = Credentials::default().with_server(ProviderId::Mojeek, "m");
        assert!(creds.any_for(ProviderId::all()));
        assert!(!creds.any_for(&[ProviderId::Brave, ProviderId::Serper]));
    }

    #[test]
    fn debug_output_redacts_keys() {
        let creds = Credentials::default().with_user(ProviderId::Brave, "super-secret");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("Brave"));
    }

    #[test]
    fn canonical_result_default_is_empty() {
        let result = CanonicalResult::default();
        assert!(result.title.is_empty());
        assert!(result.url.is_empty());
        assert!(result.display_url.is_empty());
    }
}
