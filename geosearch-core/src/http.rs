//! Outbound HTTP plumbing for provider calls.
//!
//! Providers describe a call as an [`UpstreamRequest`]; an
//! [`UpstreamTransport`] sends it and hands back the raw body. The real
//! transport is [`HttpTransport`] over a shared [`reqwest::Client`]; tests
//! substitute scripted transports.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::config::RouterConfig;
use crate::error::{SearchError, UpstreamError};
use crate::types::ProviderId;

/// Query parameter names whose values are secrets.
const SECRET_PARAMS: &[&str] = &["api_key"];

/// HTTP method of an upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// `GET` with query-string parameters.
    Get,
    /// `POST` with a JSON body.
    Post,
}

/// A fully described provider call, independent of the HTTP client.
#[derive(Clone, PartialEq)]
pub struct UpstreamRequest {
    /// Provider the call targets.
    pub provider: ProviderId,
    /// HTTP method.
    pub method: HttpMethod,
    /// Endpoint URL without query string.
    pub url: String,
    /// Query-string parameters, in order.
    pub query: Vec<(String, String)>,
    /// Extra request headers. May carry credentials.
    pub headers: Vec<(String, String)>,
    /// JSON body for `POST` calls.
    pub json_body: Option<serde_json::Value>,
}

impl UpstreamRequest {
    /// Value of the first query parameter named `name`.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Value of the first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Debug for UpstreamRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query: Vec<(&str, &str)> = self
            .query
            .iter()
            .map(|(key, value)| {
                if SECRET_PARAMS.contains(&key.as_str()) {
                    (key.as_str(), "<redacted>")
                } else {
                    (key.as_str(), value.as_str())
                }
            })
            .collect();
        let headers: Vec<&str> = self.headers.iter().map(|(key, _)| key.as_str()).collect();
        f.debug_struct("UpstreamRequest")
            .field("provider", &self.provider)
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &query)
            .field("headers", &headers)
            .field("json_body", &self.json_body.is_some())
            .finish()
    }
}

/// Sends provider calls and returns the raw response body.
///
/// Implementations report transport failures and non-success statuses as
/// [`UpstreamError`]; the caller bounds every call with its own timeout.
/// All implementations must be `Send + Sync` so a router can be shared.
pub trait UpstreamTransport: Send + Sync {
    /// Perform one call.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] if the call cannot be sent, times out, or
    /// the provider answers with a non-success status.
    fn send(
        &self,
        request: &UpstreamRequest,
    ) -> impl Future<Output = Result<String, UpstreamError>> + Send;
}

/// [`UpstreamTransport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport from router config.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the client cannot be constructed.
    pub fn new(config: &RouterConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: build_client(config)?,
            timeout: Duration::from_secs(config.timeout_seconds),
        })
    }
}

impl UpstreamTransport for HttpTransport {
    async fn send(&self, request: &UpstreamRequest) -> Result<String, UpstreamError> {
        let builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        let mut builder = builder
            .query(&request.query)
            .header(reqwest::header::ACCEPT, "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.json_body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }
        response.text().await.map_err(|e| self.classify(e))
    }
}

impl HttpTransport {
    fn classify(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(duration_ms(self.timeout))
        } else {
            // Strip the URL: Mojeek carries its key in the query string.
            UpstreamError::Transport(err.without_url().to_string())
        }
    }
}

/// Build a [`reqwest::Client`] configured for provider API calls.
///
/// The client has:
/// - Timeout from config
/// - User-Agent from config
/// - Brotli and gzip decompression
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &RouterConfig) -> Result<reqwest::Client, SearchError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(config.user_agent.as_str())
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

/// Milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UpstreamRequest {
        UpstreamRequest {
            provider: ProviderId::Mojeek,
            method: HttpMethod::Get,
            url: "https://www.mojeek.com/search".into(),
            query: vec![
                ("q".into(), "rust".into()),
                ("api_key".into(), "hunter2".into()),
            ],
            headers: vec![("X-Subscription-Token".into(), "also-secret".into())],
            json_body: None,
        }
    }

    #[test]
    fn build_client_with_default_config() {
        assert!(build_client(&RouterConfig::default()).is_ok());
    }

    #[test]
    fn build_transport_with_custom_user_agent() {
        let config = RouterConfig {
            user_agent: "CustomBot/1.0".into(),
            ..Default::default()
        };
        assert!(HttpTransport::new(&config).is_ok());
    }

    #[test]
    fn debug_redacts_secrets() {
        let debug = format!("{:?}", sample());
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("also-secret"));
        assert!(debug.contains("X-Subscription-Token"));
        assert!(debug.contains("rust"));
    }

    #[test]
    fn lookup_helpers() {
        let request = sample();
        assert_eq!(request.query_param("q"), Some("rust"));
        assert_eq!(request.query_param("missing"), None);
        assert_eq!(
            request.header("x-subscription-token"),
            Some("also-secret")
        );
    }

    #[test]
    fn duration_ms_converts() {
        assert_eq!(duration_ms(Duration::from_secs(10)), 10_000);
    }

    #[test]
    fn transport_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpTransport>();
    }
}
