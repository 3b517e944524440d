//! GitHub GraphQL client with rate limiting and retries.
//!
//! Wraps the GitHub GraphQL API v4, which is the only API exposing
//! Projects v2. Includes a token-bucket rate limiter to stay within the
//! hourly request budget, and retries transient failures (network errors,
//! 5xx, rate limiting) with exponential backoff.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use backoff::ExponentialBackoffBuilder;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{GitHubConfig, RetryConfig};

use super::models::GraphQlResponse;

/// Default GraphQL endpoint.
pub const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// Token-bucket rate limiter.
///
/// Allows up to `capacity` requests per `window`. When the bucket is
/// exhausted, [`acquire`](RateLimiter::acquire) sleeps until the window
/// resets and a token becomes available.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum tokens in the bucket.
    capacity: u32,
    /// Current available tokens.
    tokens: u32,
    /// Duration of the refill window.
    window: Duration,
    /// When the current window started.
    window_start: Instant,
}

impl RateLimiter {
    /// Create a new rate limiter with the given capacity and window.
    pub fn new(capacity: u32, window: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            tokens: capacity,
            window,
            window_start: Instant::now(),
        }
    }

    /// Acquire a single token, sleeping if necessary.
    pub async fn acquire(&mut self) {
        let elapsed = self.window_start.elapsed();
        if elapsed >= self.window {
            self.tokens = self.capacity;
            self.window_start = Instant::now();
        }

        if self.tokens > 0 {
            self.tokens -= 1;
        } else {
            let remaining = self.window.saturating_sub(elapsed);
            tracing::warn!(
                sleep_ms = u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
                "GitHub rate limit reached, sleeping"
            );
            tokio::time::sleep(remaining).await;
            self.tokens = self.capacity - 1;
            self.window_start = Instant::now();
        }
    }
}

/// HTTP client for the GitHub GraphQL API.
///
/// All methods return [`DomainResult`]. GraphQL `NOT_FOUND` errors map to
/// [`DomainError::RecordNotFound`]; every other failure maps to
/// [`DomainError::ExecutionFailed`].
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    endpoint: String,
    token: String,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    retry: RetryConfig,
}

impl GitHubClient {
    /// Create a new client with the given token and default settings.
    pub fn new(token: String) -> Self {
        Self {
            http: Client::new(),
            endpoint: GITHUB_GRAPHQL_URL.to_string(),
            token,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(5_000, Duration::from_secs(3_600)))),
            retry: RetryConfig::default(),
        }
    }

    /// Create a client from configuration.
    ///
    /// The token comes from `github.token`, or the `GITHUB_TOKEN`
    /// environment variable when that is unset.
    pub fn from_config(github: &GitHubConfig, retry: &RetryConfig) -> DomainResult<Self> {
        let token = match &github.token {
            Some(token) => token.clone(),
            None => std::env::var("GITHUB_TOKEN").map_err(|_| {
                DomainError::ValidationFailed(
                    "no GitHub token: set github.token or GITHUB_TOKEN".to_string(),
                )
            })?,
        };
        if token.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "GitHub token is empty".to_string(),
            ));
        }

        Ok(Self::new(token)
            .with_endpoint(&github.api_url)
            .with_rate_limit(github.requests_per_hour)
            .with_retry(retry.clone()))
    }

    /// Send requests to `endpoint` instead of api.github.com.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Replace the request budget.
    pub fn with_rate_limit(mut self, requests_per_hour: u32) -> Self {
        self.rate_limiter = Arc::new(Mutex::new(RateLimiter::new(
            requests_per_hour,
            Duration::from_secs(3_600),
        )));
        self
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// GraphQL endpoint in use.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run a GraphQL query or mutation and decode its `data`.
    ///
    /// Transient failures are retried up to `retry.max_retries` times.
    pub async fn graphql<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> DomainResult<T> {
        let body = serde_json::json!({ "query": query, "variables": variables });
        let attempts = AtomicU32::new(0);
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(self.retry.initial_backoff_ms))
            .with_max_interval(Duration::from_millis(self.retry.max_backoff_ms))
            .with_max_elapsed_time(None)
            .build();

        let attempts = &attempts;
        let body = &body;
        backoff::future::retry(policy, || async move {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst);
            match self.send_once::<T>(operation, body).await {
                Ok(data) => Ok(data),
                Err(Failure::Transient(err)) if attempt < self.retry.max_retries => {
                    tracing::warn!(
                        operation,
                        attempt = attempt + 1,
                        error = %err,
                        "transient GitHub failure, retrying"
                    );
                    Err(backoff::Error::transient(err))
                }
                Err(Failure::Transient(err) | Failure::Permanent(err)) => {
                    Err(backoff::Error::permanent(err))
                }
            }
        })
        .await
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        operation: &str,
        body: &serde_json::Value,
    ) -> Result<T, Failure> {
        self.rate_limiter.lock().await.acquire().await;

        let resp = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "shepherd-triage-bot")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                Failure::Transient(DomainError::ExecutionFailed(format!(
                    "GitHub {operation} request failed: {e}"
                )))
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            let err = DomainError::ExecutionFailed(format!(
                "GitHub {operation} returned {status}: {body_text}"
            ));
            return Err(if is_transient_status(status, &body_text) {
                Failure::Transient(err)
            } else {
                Failure::Permanent(err)
            });
        }

        let parsed: GraphQlResponse<T> = resp.json().await.map_err(|e| {
            Failure::Permanent(DomainError::SerializationError(format!(
                "GitHub {operation} response parse failed: {e}"
            )))
        })?;

        if !parsed.errors.is_empty() {
            let messages = parsed
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            if parsed.errors.iter().any(|e| e.is_rate_limited()) {
                return Err(Failure::Transient(DomainError::ExecutionFailed(format!(
                    "GitHub {operation} rate limited: {messages}"
                ))));
            }
            if parsed.errors.iter().all(|e| e.is_not_found()) {
                return Err(Failure::Permanent(DomainError::RecordNotFound(messages)));
            }
            return Err(Failure::Permanent(DomainError::ExecutionFailed(format!(
                "GitHub {operation} failed: {messages}"
            ))));
        }

        parsed.data.ok_or_else(|| {
            Failure::Permanent(DomainError::ExecutionFailed(format!(
                "GitHub {operation} returned no data"
            )))
        })
    }
}

/// Classification of a single request failure.
enum Failure {
    Transient(DomainError),
    Permanent(DomainError),
}

/// 5xx, 429, and 403 secondary rate limits are worth retrying.
fn is_transient_status(status: StatusCode, body: &str) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && body.to_lowercase().contains("rate limit"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Viewer {
        viewer: Login,
    }

    #[derive(Debug, Deserialize)]
    struct Login {
        login: String,
    }

    fn fast_retry(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
        }
    }

    fn client_for(server: &mockito::Server, max_retries: u32) -> GitHubClient {
        GitHubClient::new("ghp_test".to_string())
            .with_endpoint(format!("{}/graphql", server.url()))
            .with_retry(fast_retry(max_retries))
    }

    #[test]
    fn test_rate_limiter_creation() {
        let rl = RateLimiter::new(5_000, Duration::from_secs(3_600));
        assert_eq!(rl.capacity, 5_000);
        assert_eq!(rl.tokens, 5_000);
    }

    #[tokio::test]
    async fn test_rate_limiter_acquire_decrements_tokens() {
        let mut rl = RateLimiter::new(5, Duration::from_secs(60));
        rl.acquire().await;
        assert_eq!(rl.tokens, 4);
        rl.acquire().await;
        assert_eq!(rl.tokens, 3);
    }

    #[test]
    fn test_transient_status_classification() {
        assert!(is_transient_status(StatusCode::BAD_GATEWAY, ""));
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS, ""));
        assert!(is_transient_status(
            StatusCode::FORBIDDEN,
            "You have exceeded a secondary rate limit"
        ));
        assert!(!is_transient_status(StatusCode::FORBIDDEN, "Resource not accessible"));
        assert!(!is_transient_status(StatusCode::UNAUTHORIZED, ""));
    }

    #[test]
    fn test_from_config_prefers_explicit_token() {
        let github = GitHubConfig {
            token: Some("ghp_explicit".into()),
            ..Default::default()
        };
        let client = GitHubClient::from_config(&github, &RetryConfig::default()).unwrap();
        assert_eq!(client.token, "ghp_explicit");
        assert_eq!(client.endpoint(), GITHUB_GRAPHQL_URL);
    }

    #[test]
    fn test_from_config_without_token() {
        temp_env::with_var_unset("GITHUB_TOKEN", || {
            let result = GitHubClient::from_config(&GitHubConfig::default(), &RetryConfig::default());
            assert!(matches!(result, Err(DomainError::ValidationFailed(_))));
        });
    }

    #[tokio::test]
    async fn test_graphql_decodes_data() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_header("authorization", "Bearer ghp_test")
            .with_status(200)
            .with_body(r#"{"data":{"viewer":{"login":"octocat"}}}"#)
            .create_async()
            .await;

        let client = client_for(&server, 0);
        let data: Viewer = client
            .graphql("viewer", "query { viewer { login } }", serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(data.viewer.login, "octocat");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_graphql_retries_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .with_status(502)
            .with_body("bad gateway")
            .expect(3)
            .create_async()
            .await;

        let client = client_for(&server, 2);
        let result: DomainResult<Viewer> = client
            .graphql("viewer", "query { viewer { login } }", serde_json::json!({}))
            .await;
        assert!(matches!(result, Err(DomainError::ExecutionFailed(msg)) if msg.contains("502")));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_graphql_retries_rate_limited_errors() {
        let mut server = mockito::Server::new_async().await;
        let limited = server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(
                r#"{"data":null,"errors":[{"type":"RATE_LIMITED","message":"API rate limit exceeded"}]}"#,
            )
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(r#"{"data":{"viewer":{"login":"octocat"}}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, 2);
        let result: Viewer = client
            .graphql("viewer", "query { viewer { login } }", serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(result.viewer.login, "octocat");
        limited.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_graphql_retries_secondary_rate_limit() {
        let mut server = mockito::Server::new_async().await;
        let limited = server
            .mock("POST", "/graphql")
            .with_status(403)
            .with_body(r#"{"message":"You have exceeded a secondary rate limit. Please wait a few minutes before you try again."}"#)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(r#"{"data":{"viewer":{"login":"octocat"}}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, 2);
        let result: Viewer = client
            .graphql("viewer", "query { viewer { login } }", serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(result.viewer.login, "octocat");
        limited.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_graphql_does_not_retry_client_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .with_status(401)
            .with_body(r#"{"message":"Bad credentials"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, 3);
        let result: DomainResult<Viewer> = client
            .graphql("viewer", "query { viewer { login } }", serde_json::json!({}))
            .await;
        assert!(result.is_err());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_graphql_not_found_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(
                r#"{"data":null,"errors":[{"type":"NOT_FOUND","message":"Could not resolve to a node with the global id of 'X'"}]}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server, 0);
        let result: DomainResult<Viewer> = client
            .graphql("fetch", "query { node(id: \"X\") { id } }", serde_json::json!({}))
            .await;
        assert!(matches!(result, Err(DomainError::RecordNotFound(_))));
    }
}
