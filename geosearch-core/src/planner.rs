//! Ordered attempt construction.
//!
//! A plan is the concatenation of three tiers, always in this order:
//!
//! 1. **Exact**: providers that natively support the requested country.
//! 2. **Proxy**: providers that can serve a deterministic substitute.
//! 3. **Global**: every provider's worldwide route.
//!
//! Inside a tier providers follow the configured priority order and each
//! provider yields one attempt per usable credential, user key first.
//! Plans are pure functions of their input: no randomness, no health-based
//! reordering, so identical requests produce identical traces.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::country::CountryCode;
use crate::coverage;
use crate::types::{CredentialSource, Credentials, ProviderId};

/// How an attempt's country parameter relates to the requested country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountryResolution {
    /// The provider natively supports the requested country.
    Exact,
    /// The provider serves a substitute country instead.
    Proxy,
    /// No country targeting; the provider's worldwide route.
    Global,
}

impl CountryResolution {
    /// Stable lowercase identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Proxy => "proxy",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for CountryResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fully specified provider call, constructed once per request.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderAttempt {
    /// Which provider to call.
    pub provider: ProviderId,
    /// API key to authenticate with.
    pub credential: String,
    /// Who owns `credential`.
    pub credential_source: CredentialSource,
    /// Country the caller asked for, if any.
    pub requested_country: Option<CountryCode>,
    /// Country actually targeted (the substitute for proxy attempts).
    pub resolved_country: Option<CountryCode>,
    /// Provider-encoded country parameter, if the route sends one.
    pub country_param: Option<String>,
    /// Relationship between requested and resolved country.
    pub resolution: CountryResolution,
    /// Short human-readable explanation for diagnostics.
    pub reason: String,
}

/// Identity of an attempt; two attempts with equal keys are the same attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttemptKey {
    provider: ProviderId,
    credential_source: CredentialSource,
    requested_country: Option<CountryCode>,
    resolved_country: Option<CountryCode>,
    country_param: Option<String>,
    resolution: CountryResolution,
}

impl ProviderAttempt {
    /// The deduplication key of this attempt.
    pub fn key(&self) -> AttemptKey {
        AttemptKey {
            provider: self.provider,
            credential_source: self.credential_source,
            requested_country: self.requested_country,
            resolved_country: self.resolved_country,
            country_param: self.country_param.clone(),
            resolution: self.resolution,
        }
    }
}

impl fmt::Debug for ProviderAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderAttempt")
            .field("provider", &self.provider)
            .field("credential", &"<redacted>")
            .field("credential_source", &self.credential_source)
            .field("requested_country", &self.requested_country)
            .field("resolved_country", &self.resolved_country)
            .field("country_param", &self.country_param)
            .field("resolution", &self.resolution)
            .field("reason", &self.reason)
            .finish()
    }
}

/// Credential-free view of an attempt, safe to print or serialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAttempt {
    /// Which provider would be called.
    pub provider: ProviderId,
    /// Who owns the credential.
    pub credential_source: CredentialSource,
    /// Country the caller asked for, if any.
    pub requested_country: Option<CountryCode>,
    /// Country actually targeted.
    pub resolved_country: Option<CountryCode>,
    /// Provider-encoded country parameter.
    pub country_param: Option<String>,
    /// Tier of the attempt.
    pub resolution: CountryResolution,
    /// Why the attempt was planned.
    pub reason: String,
}

impl From<&ProviderAttempt> for PlannedAttempt {
    fn from(attempt: &ProviderAttempt) -> Self {
        Self {
            provider: attempt.provider,
            credential_source: attempt.credential_source,
            requested_country: attempt.requested_country,
            resolved_country: attempt.resolved_country,
            country_param: attempt.country_param.clone(),
            resolution: attempt.resolution,
            reason: attempt.reason.clone(),
        }
    }
}

/// Build the ordered, duplicate-free attempt list for a request.
///
/// `priority` is the configured provider order. Providers without any
/// usable credential are skipped silently; an empty plan means no
/// credentials were available for any prioritised provider.
pub fn plan_attempts(
    requested: Option<CountryCode>,
    credentials: &Credentials,
    priority: &[ProviderId],
) -> Vec<ProviderAttempt> {
    let mut plan = Vec::new();
    let mut seen = HashSet::new();

    if let Some(country) = requested {
        // Exact tier.
        for provider in priority {
            if coverage::supports_exact(*provider, country) {
                let param = coverage::country_param(*provider, country);
                push_for_credentials(
                    &mut plan,
                    &mut seen,
                    credentials,
                    Route {
                        provider: *provider,
                        requested,
                        resolved: Some(country),
                        country_param: Some(param),
                        resolution: CountryResolution::Exact,
                        reason: format!("{provider} supports {country} natively"),
                    },
                );
            }
        }

        // Proxy tier.
        for provider in priority {
            if let Some(substitute) = coverage::resolve_proxy(*provider, country) {
                let param = coverage::country_param(*provider, substitute);
                push_for_credentials(
                    &mut plan,
                    &mut seen,
                    credentials,
                    Route {
                        provider: *provider,
                        requested,
                        resolved: Some(substitute),
                        country_param: Some(param),
                        resolution: CountryResolution::Proxy,
                        reason: format!("{provider} proxies {country} via {substitute}"),
                    },
                );
            }
        }
    }

    // Global tier, always last.
    for provider in priority {
        push_for_credentials(
            &mut plan,
            &mut seen,
            credentials,
            Route {
                provider: *provider,
                requested,
                resolved: None,
                country_param: coverage::global_param(*provider).map(str::to_owned),
                resolution: CountryResolution::Global,
                reason: format!("{provider} worldwide route"),
            },
        );
    }

    tracing::debug!(
        attempts = plan.len(),
        country = ?requested.map(|c| c.as_str()),
        "attempt plan built"
    );
    plan
}

/// Returns `true` if the plan targets the requested country in any way.
pub fn has_targeted_attempt(plan: &[ProviderAttempt]) -> bool {
    plan.iter()
        .any(|attempt| attempt.resolution != CountryResolution::Global)
}

/// Everything about an attempt except the credential.
struct Route {
    provider: ProviderId,
    requested: Option<CountryCode>,
    resolved: Option<CountryCode>,
    country_param: Option<String>,
    resolution: CountryResolution,
    reason: String,
}

fn push_for_credentials(
    plan: &mut Vec<ProviderAttempt>,
    seen: &mut HashSet<AttemptKey>,
    credentials: &Credentials,
    route: Route,
) {
    for (source, key) in credentials.ordered_for(route.provider) {
        let attempt = ProviderAttempt {
            provider: route.provider,
            credential: key.to_owned(),
            credential_source: source,
            requested_country: route.requested,
            resolved_country: route.resolved,
            country_param: route.country_param.clone(),
            resolution: route.resolution,
            reason: route.reason.clone(),
        };
        if seen.insert(attempt.key()) {
            plan.push(attempt);
        }
    }
}
