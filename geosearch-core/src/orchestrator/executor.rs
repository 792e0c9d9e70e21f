//! Sequential failover over a planned attempt list.
//!
//! Attempts run strictly in plan order. Server-credential attempts first
//! consume a unit of the daily budget and are skipped without a network
//! call when none is left. Each call is bounded by the per-call timeout
//! and never retried; the first well-formed response wins, even when it
//! carries zero results, and nothing after it runs.
//!
//! The walk itself is a fold: [`WalkState::advance`] is a pure transition
//! from one accumulated state to the next, so it can be tested without
//! any I/O.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EndpointConfig;
use crate::cost::CostControl;
use crate::country::CountryCode;
use crate::error::{SearchError, UpstreamError};
use crate::http::{duration_ms, UpstreamTransport};
use crate::planner::{CountryResolution, ProviderAttempt};
use crate::providers::{self, CallParams};
use crate::types::{CanonicalResult, CredentialSource, ProviderId};

/// Terminal state of one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Well-formed response; the walk stopped here.
    Success {
        /// Records parsed from the response, before deduplication.
        result_count: usize,
    },
    /// Server credential with no daily budget left; no call was made.
    SkippedBudget,
    /// Transport failure or non-success HTTP status.
    UpstreamError {
        /// Error description, free of credentials.
        detail: String,
    },
    /// The call exceeded the per-call timeout.
    Timeout,
    /// The body was not a provider payload.
    ParseError {
        /// Parser message.
        detail: String,
    },
}

impl AttemptOutcome {
    /// Machine-readable status string.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::SkippedBudget => "skipped_budget",
            Self::UpstreamError { .. } => "upstream_error",
            Self::Timeout => "timeout",
            Self::ParseError { .. } => "parse_error",
        }
    }
}

/// One entry of the attempt trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Provider that was (or would have been) called.
    pub provider: ProviderId,
    /// Who owned the credential.
    pub credential_source: CredentialSource,
    /// Tier of the attempt.
    pub resolution: CountryResolution,
    /// Country the caller asked for.
    pub requested_country: Option<CountryCode>,
    /// Country actually targeted.
    pub resolved_country: Option<CountryCode>,
    /// Provider-encoded country parameter.
    pub country_param: Option<String>,
    /// What happened.
    pub outcome: AttemptOutcome,
}

impl AttemptRecord {
    fn new(attempt: &ProviderAttempt, outcome: AttemptOutcome) -> Self {
        Self {
            provider: attempt.provider,
            credential_source: attempt.credential_source,
            resolution: attempt.resolution,
            requested_country: attempt.requested_country,
            resolved_country: attempt.resolved_country,
            country_param: attempt.country_param.clone(),
            outcome,
        }
    }
}

/// The attempt that produced the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedRoute {
    /// Winning provider.
    pub provider: ProviderId,
    /// Who owned the winning credential.
    pub credential_source: CredentialSource,
    /// Tier of the winning attempt.
    pub resolution: CountryResolution,
    /// Country actually targeted.
    pub resolved_country: Option<CountryCode>,
    /// Provider-encoded country parameter.
    pub country_param: Option<String>,
}

impl From<&ProviderAttempt> for SelectedRoute {
    fn from(attempt: &ProviderAttempt) -> Self {
        Self {
            provider: attempt.provider,
            credential_source: attempt.credential_source,
            resolution: attempt.resolution,
            resolved_country: attempt.resolved_country,
            country_param: attempt.country_param.clone(),
        }
    }
}

/// Raw result of running one attempt, before it is folded into the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Skipped for budget.
    Skipped,
    /// Parsed response.
    Succeeded(Vec<CanonicalResult>),
    /// Call or parse failure.
    Failed(UpstreamError),
}

/// Accumulated state of a walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkState {
    trace: Vec<AttemptRecord>,
    winner: Option<(SelectedRoute, Vec<CanonicalResult>)>,
}

impl WalkState {
    /// Fold one attempt's step into the state.
    ///
    /// A finished walk absorbs nothing further.
    #[must_use]
    pub fn advance(mut self, attempt: &ProviderAttempt, step: Step) -> Self {
        if self.is_finished() {
            return self;
        }
        let outcome = match step {
            Step::Skipped => AttemptOutcome::SkippedBudget,
            Step::Succeeded(results) => {
                let outcome = AttemptOutcome::Success {
                    result_count: results.len(),
                };
                self.winner = Some((SelectedRoute::from(attempt), results));
                outcome
            }
            Step::Failed(UpstreamError::Timeout(_)) => AttemptOutcome::Timeout,
            Step::Failed(UpstreamError::Parse(detail)) => AttemptOutcome::ParseError { detail },
            Step::Failed(err) => AttemptOutcome::UpstreamError {
                detail: err.to_string(),
            },
        };
        self.trace.push(AttemptRecord::new(attempt, outcome));
        self
    }

    /// Whether an attempt has succeeded.
    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    /// Trace accumulated so far.
    pub fn trace(&self) -> &[AttemptRecord] {
        &self.trace
    }

    /// Close the walk.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::BudgetExhausted`] when every attempt was
    /// skipped for budget, otherwise [`SearchError::AllAttemptsFailed`]
    /// when nothing succeeded.
    pub fn finish(self) -> Result<Execution, SearchError> {
        match self.winner {
            Some((selected, results)) => Ok(Execution {
                results,
                selected,
                trace: self.trace,
            }),
            None if !self.trace.is_empty()
                && self
                    .trace
                    .iter()
                    .all(|r| r.outcome == AttemptOutcome::SkippedBudget) =>
            {
                Err(SearchError::BudgetExhausted { trace: self.trace })
            }
            None => Err(SearchError::AllAttemptsFailed { trace: self.trace }),
        }
    }
}

/// A successful walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Parsed results of the winning attempt, in upstream order.
    pub results: Vec<CanonicalResult>,
    /// The winning attempt.
    pub selected: SelectedRoute,
    /// Every attempt considered, winner last.
    pub trace: Vec<AttemptRecord>,
}

/// Runs a plan against a transport.
pub struct AttemptExecutor<'a, T> {
    transport: &'a T,
    cost: &'a CostControl,
    endpoints: &'a EndpointConfig,
    timeout: Duration,
}

impl<'a, T: UpstreamTransport> AttemptExecutor<'a, T> {
    /// Create an executor with a per-call `timeout`.
    pub fn new(
        transport: &'a T,
        cost: &'a CostControl,
        endpoints: &'a EndpointConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            cost,
            endpoints,
            timeout,
        }
    }

    /// Walk `plan` until the first success.
    ///
    /// # Errors
    ///
    /// See [`WalkState::finish`].
    pub async fn execute(
        &self,
        plan: &[ProviderAttempt],
        params: &CallParams<'_>,
    ) -> Result<Execution, SearchError> {
        let mut state = WalkState::default();
        for attempt in plan {
            if state.is_finished() {
                break;
            }
            let step = self.run(attempt, params).await;
            state = state.advance(attempt, step);
        }
        state.finish()
    }

    async fn run(&self, attempt: &ProviderAttempt, params: &CallParams<'_>) -> Step {
        if attempt.credential_source == CredentialSource::Server && !self.cost.try_consume_budget()
        {
            tracing::debug!(
                provider = %attempt.provider,
                resolution = %attempt.resolution,
                "skipping server attempt: daily budget exhausted"
            );
            return Step::Skipped;
        }

        tracing::debug!(
            provider = %attempt.provider,
            credential_source = %attempt.credential_source,
            resolution = %attempt.resolution,
            country_param = attempt.country_param.as_deref().unwrap_or("-"),
            reason = %attempt.reason,
            "executing attempt"
        );

        let request = providers::build_request(attempt, params, self.endpoints);
        let body = match tokio::time::timeout(self.timeout, self.transport.send(&request)).await {
            Ok(Ok(body)) => body,
            Ok(Err(err)) => return self.failed(attempt, err),
            Err(_) => return self.failed(attempt, UpstreamError::Timeout(duration_ms(self.timeout))),
        };

        match providers::parse_response(attempt.provider, &body) {
            Ok(results) => {
                tracing::info!(
                    provider = %attempt.provider,
                    credential_source = %attempt.credential_source,
                    resolution = %attempt.resolution,
                    results = results.len(),
                    "attempt succeeded"
                );
                Step::Succeeded(results)
            }
            Err(err) => self.failed(attempt, err.into()),
        }
    }

    fn failed(&self, attempt: &ProviderAttempt, err: UpstreamError) -> Step {
        tracing::warn!(
            provider = %attempt.provider,
            credential_source = %attempt.credential_source,
            resolution = %attempt.resolution,
            error = %err,
            "attempt failed"
        );
        Step::Failed(err)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::config::CostConfig;
    use crate::cost::ManualClock;
    use crate::http::UpstreamRequest;
    use chrono::{TimeZone, Utc};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    enum Reply {
        Body(&'static str),
        Error(UpstreamError),
        Hang,
    }

    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Reply>>,
        calls: Mutex<Vec<ProviderId>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::default(),
            }
        }

        fn calls(&self) -> Vec<ProviderId> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl UpstreamTransport for ScriptedTransport {
        async fn send(&self, request: &UpstreamRequest) -> Result<String, UpstreamError> {
            self.calls.lock().unwrap().push(request.provider);
            let reply = self.replies.lock().unwrap().pop_front();
            match reply {
                Some(Reply::Body(body)) => Ok(body.to_owned()),
                Some(Reply::Error(err)) => Err(err),
                Some(Reply::Hang) => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok("{}".to_owned())
                }
                None => Err(UpstreamError::Transport("no scripted reply".into())),
            }
        }
    }

    fn attempt(provider: ProviderId, source: CredentialSource) -> ProviderAttempt {
        ProviderAttempt {
            provider,
            credential: "key".into(),
            credential_source: source,
            requested_country: None,
            resolved_country: None,
            country_param: None,
            resolution: CountryResolution::Global,
            reason: "test".into(),
        }
    }

    fn cost(budget: u32) -> CostControl {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        ));
        CostControl::new(
            &CostConfig {
                daily_miss_budget: budget,
                ..Default::default()
            },
            clock,
        )
    }

    const PARAMS: CallParams<'static> = CallParams {
        query: "rust",
        language: None,
        max_results: 10,
    };

    const SERPER_OK: &str = r#"{"organic":[{"title":"A","link":"https://a.example/"}]}"#;
    const BRAVE_OK: &str = r#"{"web":{"results":[{"title":"B","url":"https://b.example/"}]}}"#;

    async fn run(
        transport: &ScriptedTransport,
        cost: &CostControl,
        plan: &[ProviderAttempt],
    ) -> Result<Execution, SearchError> {
        let endpoints = EndpointConfig::default();
        AttemptExecutor::new(transport, cost, &endpoints, Duration::from_millis(100))
            .execute(plan, &PARAMS)
            .await
    }

    #[test]
    fn outcome_status_strings() {
        assert_eq!(AttemptOutcome::Success { result_count: 0 }.status(), "success");
        assert_eq!(AttemptOutcome::SkippedBudget.status(), "skipped_budget");
        assert_eq!(
            AttemptOutcome::UpstreamError {
                detail: String::new()
            }
            .status(),
            "upstream_error"
        );
        assert_eq!(AttemptOutcome::Timeout.status(), "timeout");
        assert_eq!(
            AttemptOutcome::ParseError {
                detail: String::new()
            }
            .status(),
            "parse_error"
        );
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(AttemptOutcome::Success { result_count: 3 }).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["result_count"], 3);
        let json = serde_json::to_value(AttemptOutcome::SkippedBudget).unwrap();
        assert_eq!(json["status"], "skipped_budget");
    }

    #[test]
    fn advance_is_a_pure_fold() {
        let a = attempt(ProviderId::Brave, CredentialSource::User);
        let b = attempt(ProviderId::Serper, CredentialSource::Server);
        let state = WalkState::default()
            .advance(&a, Step::Failed(UpstreamError::Status(503)))
            .advance(&b, Step::Succeeded(vec![CanonicalResult::default()]));
        assert!(state.is_finished());
        assert_eq!(state.trace().len(), 2);
        assert_eq!(
            state.trace()[0].outcome,
            AttemptOutcome::UpstreamError {
                detail: "upstream returned HTTP 503".into()
            }
        );

        let after = state.clone().advance(&a, Step::Skipped);
        assert_eq!(after, state);
    }

    #[test]
    fn finish_distinguishes_budget_exhaustion() {
        let a = attempt(ProviderId::Brave, CredentialSource::Server);
        let all_skipped = WalkState::default()
            .advance(&a, Step::Skipped)
            .advance(&a, Step::Skipped);
        assert!(matches!(
            all_skipped.finish(),
            Err(SearchError::BudgetExhausted { trace }) if trace.len() == 2
        ));

        let mixed = WalkState::default()
            .advance(&a, Step::Skipped)
            .advance(&a, Step::Failed(UpstreamError::Timeout(10)));
        assert!(matches!(
            mixed.finish(),
            Err(SearchError::AllAttemptsFailed { .. })
        ));

        assert!(matches!(
            WalkState::default().finish(),
            Err(SearchError::AllAttemptsFailed { trace }) if trace.is_empty()
        ));
    }

    #[tokio::test]
    async fn stops_at_first_success() {
        let transport = ScriptedTransport::new(vec![Reply::Body(BRAVE_OK), Reply::Body(SERPER_OK)]);
        let cost = cost(10);
        let plan = vec![
            attempt(ProviderId::Brave, CredentialSource::User),
            attempt(ProviderId::Serper, CredentialSource::User),
        ];
        let execution = run(&transport, &cost, &plan).await.unwrap();
        assert_eq!(transport.calls(), vec![ProviderId::Brave]);
        assert_eq!(execution.trace.len(), 1);
        assert_eq!(execution.selected.provider, ProviderId::Brave);
        assert_eq!(execution.results[0].url, "https://b.example/");
    }

    #[tokio::test]
    async fn empty_success_still_wins() {
        let transport = ScriptedTransport::new(vec![Reply::Body("{}"), Reply::Body(SERPER_OK)]);
        let cost = cost(10);
        let plan = vec![
            attempt(ProviderId::Mojeek, CredentialSource::User),
            attempt(ProviderId::Serper, CredentialSource::User),
        ];
        let execution = run(&transport, &cost, &plan).await.unwrap();
        assert!(execution.results.is_empty());
        assert_eq!(execution.selected.provider, ProviderId::Mojeek);
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn fails_over_through_error_kinds() {
        let transport = ScriptedTransport::new(vec![
            Reply::Hang,
            Reply::Error(UpstreamError::Status(429)),
            Reply::Body("<html>"),
            Reply::Body(SERPER_OK),
        ]);
        let cost = cost(10);
        let plan = vec![
            attempt(ProviderId::Brave, CredentialSource::User),
            attempt(ProviderId::Mojeek, CredentialSource::User),
            attempt(ProviderId::Brave, CredentialSource::Server),
            attempt(ProviderId::Serper, CredentialSource::Server),
        ];
        let execution = run(&transport, &cost, &plan).await.unwrap();
        let statuses: Vec<_> = execution.trace.iter().map(|r| r.outcome.status()).collect();
        assert_eq!(
            statuses,
            vec!["timeout", "upstream_error", "parse_error", "success"]
        );
        assert_eq!(cost.budget_snapshot().used, 2);
    }

    #[tokio::test]
    async fn budget_gate_skips_without_calling() {
        let transport = ScriptedTransport::new(vec![Reply::Body(SERPER_OK)]);
        let cost = cost(0);
        let plan = vec![
            attempt(ProviderId::Brave, CredentialSource::Server),
            attempt(ProviderId::Serper, CredentialSource::User),
        ];
        let execution = run(&transport, &cost, &plan).await.unwrap();
        assert_eq!(transport.calls(), vec![ProviderId::Serper]);
        assert_eq!(execution.trace[0].outcome, AttemptOutcome::SkippedBudget);
        assert_eq!(execution.selected.credential_source, CredentialSource::User);
    }

    #[tokio::test]
    async fn all_server_attempts_skipped_is_budget_exhausted() {
        let transport = ScriptedTransport::default();
        let cost = cost(0);
        let plan = vec![
            attempt(ProviderId::Brave, CredentialSource::Server),
            attempt(ProviderId::Serper, CredentialSource::Server),
        ];
        let err = run(&transport, &cost, &plan).await.unwrap_err();
        assert!(matches!(err, SearchError::BudgetExhausted { .. }));
        assert_eq!(err.trace().len(), 2);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn user_attempts_do_not_consume_budget() {
        let transport = ScriptedTransport::new(vec![Reply::Error(UpstreamError::Status(500))]);
        let cost = cost(5);
        let plan = vec![attempt(ProviderId::Brave, CredentialSource::User)];
        let err = run(&transport, &cost, &plan).await.unwrap_err();
        assert!(matches!(err, SearchError::AllAttemptsFailed { .. }));
        assert_eq!(cost.budget_snapshot().used, 0);
    }
}
