//! Rate-limit aware HTTP client for the Modrinth API.

use std::time::Duration;

use reqwest::Url;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::RegistryError;
use crate::retry::RetryPolicy;

/// Public Modrinth API root.
pub const DEFAULT_BASE_URL: &str = "https://api.modrinth.com/v2/";

/// Default timeout for registry requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the number of requests left in the current window.
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Header carrying the seconds until the window resets.
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// User agent sent with every registry and artifact request.
pub fn default_user_agent() -> String {
    format!("gsmc-pack/{}", env!("CARGO_PKG_VERSION"))
}

/// Rate-limit state announced by a single response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub remaining: i64,
    pub reset_seconds: u64,
}

impl RateLimit {
    /// Reads both rate-limit headers; either one missing is a protocol error.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, RegistryError> {
        let remaining = header_value(headers, REMAINING_HEADER)?;
        let reset = header_value(headers, RESET_HEADER)?;

        let remaining =
            remaining
                .parse::<i64>()
                .map_err(|_| RegistryError::InvalidRateLimitHeader {
                    header: REMAINING_HEADER,
                    value: remaining.to_string(),
                })?;
        let reset_seconds =
            reset
                .parse::<u64>()
                .map_err(|_| RegistryError::InvalidRateLimitHeader {
                    header: RESET_HEADER,
                    value: reset.to_string(),
                })?;

        Ok(Self {
            remaining,
            reset_seconds,
        })
    }

    pub fn is_depleted(&self) -> bool {
        self.remaining < 1
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, RegistryError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .ok_or(RegistryError::MissingRateLimitHeader(name))
}

/// HTTP client for the Modrinth API.
///
/// Every call is a fresh request; nothing is cached between calls and no
/// rate-limit counter is shared between concurrent callers.
#[derive(Debug, Clone)]
pub struct ModrinthClient {
    http: reqwest::Client,
    base_url: Url,
    policy: RetryPolicy,
}

/// Builder for ModrinthClient.
#[derive(Debug)]
pub struct ModrinthClientBuilder {
    base_url: String,
    user_agent: String,
    timeout: Duration,
    policy: RetryPolicy,
}

impl ModrinthClient {
    /// Create a new builder for ModrinthClient.
    pub fn builder() -> ModrinthClientBuilder {
        ModrinthClientBuilder {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: default_user_agent(),
            timeout: DEFAULT_TIMEOUT,
            policy: RetryPolicy::default(),
        }
    }

    /// Create a client for the public Modrinth API.
    pub fn new() -> Result<Self, RegistryError> {
        Self::builder().build()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Issue a GET against `endpoint` (relative to the API root).
    ///
    /// When the response reports a depleted quota the same request is sent
    /// again after the announced reset delay, up to the policy's attempt
    /// ceiling. Responses of any status are returned as long as they carry
    /// valid rate-limit headers.
    pub async fn request(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, RegistryError> {
        let url = self.endpoint_url(endpoint)?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!("GET {} (attempt {})", url, attempt);

            let response = self.http.get(url.clone()).query(query).send().await?;
            let limit = RateLimit::from_headers(response.headers())?;

            if !limit.is_depleted() {
                return Ok(response);
            }

            if !self.policy.should_retry(attempt) {
                return Err(RegistryError::Unreachable {
                    endpoint: endpoint.to_string(),
                    attempts: attempt,
                });
            }

            let delay = self.policy.delay_for(limit.reset_seconds);
            warn!(
                "Modrinth rate limit reached, refetching '{}' in {} ms",
                endpoint,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Issue a GET and decode the JSON body; non-success statuses yield `None`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, RegistryError> {
        let response = self.request(endpoint, query).await?;
        let status = response.status();
        if !status.is_success() {
            debug!("'{}' answered {}", endpoint, status);
            return Ok(None);
        }
        Ok(Some(response.json::<T>().await?))
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url, RegistryError> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|source| RegistryError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                source,
            })
    }
}

impl ModrinthClientBuilder {
    /// Set the API root (for testing against a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set timeout for HTTP requests.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the ModrinthClient.
    pub fn build(self) -> Result<ModrinthClient, RegistryError> {
        // `Url::join` drops the last path segment unless the root ends in '/'.
        let mut root = self.base_url;
        if !root.ends_with('/') {
            root.push('/');
        }
        let base_url = Url::parse(&root).map_err(|source| RegistryError::InvalidEndpoint {
            endpoint: root.clone(),
            source,
        })?;

        let http = reqwest::Client::builder()
            .user_agent(self.user_agent)
            .timeout(self.timeout)
            .build()?;

        Ok(ModrinthClient {
            http,
            base_url,
            policy: self.policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn quota(remaining: &str, reset: &str) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header(REMAINING_HEADER, remaining)
            .insert_header(RESET_HEADER, reset)
    }

    fn client_for(server: &MockServer, policy: RetryPolicy) -> ModrinthClient {
        ModrinthClient::builder()
            .base_url(server.uri())
            .retry_policy(policy)
            .build()
            .expect("client should build")
    }

    #[test]
    fn builder_defaults() {
        let client = ModrinthClient::new().unwrap();
        assert_eq!(client.base_url().as_str(), DEFAULT_BASE_URL);
        assert_eq!(client.policy(), &RetryPolicy::default());
    }

    #[test]
    fn builder_appends_trailing_slash() {
        let client = ModrinthClient::builder()
            .base_url("http://127.0.0.1:9/v2")
            .build()
            .unwrap();
        assert_eq!(
            client.endpoint_url("/project/sodium").unwrap().as_str(),
            "http://127.0.0.1:9/v2/project/sodium"
        );
    }

    #[test]
    fn rate_limit_requires_both_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(REMAINING_HEADER, "10".parse().unwrap());
        assert!(matches!(
            RateLimit::from_headers(&headers),
            Err(RegistryError::MissingRateLimitHeader(RESET_HEADER))
        ));

        headers.insert(RESET_HEADER, "soon".parse().unwrap());
        assert!(matches!(
            RateLimit::from_headers(&headers),
            Err(RegistryError::InvalidRateLimitHeader { header: RESET_HEADER, .. })
        ));

        headers.insert(RESET_HEADER, "7".parse().unwrap());
        let limit = RateLimit::from_headers(&headers).unwrap();
        assert_eq!(limit.remaining, 10);
        assert_eq!(limit.reset_seconds, 7);
        assert!(!limit.is_depleted());
    }

    #[tokio::test]
    async fn sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/project/sodium"))
            .and(header("user-agent", default_user_agent().as_str()))
            .respond_with(quota("300", "60"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, RetryPolicy::default());
        let response = client.request("project/sodium", &[]).await.unwrap();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn missing_header_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/project/sodium"))
            .respond_with(ResponseTemplate::new(200).insert_header(RESET_HEADER, "0"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, RetryPolicy::default());
        let err = client.request("project/sodium", &[]).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::MissingRateLimitHeader(REMAINING_HEADER)
        ));
        assert!(err.is_protocol_error());
    }

    #[tokio::test]
    async fn depleted_quota_retries_once_after_grace() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/project/sodium"))
            .respond_with(quota("0", "0"))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/project/sodium"))
            .respond_with(quota("299", "60"))
            .with_priority(2)
            .mount(&server)
            .await;

        let client = client_for(&server, RetryPolicy::default());
        let started = Instant::now();
        let response = client.request("project/sodium", &[]).await.unwrap();

        assert!(response.status().is_success());
        assert!(started.elapsed() >= Duration::from_secs(1));
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
    }

    #[tokio::test]
    async fn exhausted_ceiling_is_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/project/sodium"))
            .respond_with(quota("0", "0"))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&server, RetryPolicy::new(3, Duration::from_millis(5)));
        match client.request("project/sodium", &[]).await {
            Err(RegistryError::Unreachable { endpoint, attempts }) => {
                assert_eq!(endpoint, "project/sodium");
                assert_eq!(attempts, 3);
            }
            other => panic!("Expected Unreachable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn get_json_maps_not_found_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/project/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .insert_header(REMAINING_HEADER, "299")
                    .insert_header(RESET_HEADER, "60"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, RetryPolicy::default());
        let value: Option<serde_json::Value> =
            client.get_json("project/missing", &[]).await.unwrap();
        assert!(value.is_none());
    }
}
