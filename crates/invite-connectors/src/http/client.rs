//! Shared JSON-over-HTTP client
//!
//! Every request carries a bearer token and is bounded by the client timeout.
//! Only GET requests are retried, and only for transient failures; POST
//! requests (signing, invitation creation) are sent exactly once.
//!
//! Paths are given as segments and each one is percent-encoded on its own,
//! so an identifier can never add segments, a query or a fragment.

use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Result, ServiceError};

/// Longest error body echoed back in a `ServiceError`
const MAX_ERROR_BODY: usize = 200;

/// Bounded retry for transient lookup failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub max_retries: u32,
    /// Delay before retry `n` is `backoff * n`
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Create a retry policy
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Never retry
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(200))
    }
}

/// HTTP client bound to one service base URL
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    retry: RetryPolicy,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("retry", &self.retry)
            .finish()
    }
}

impl ApiClient {
    /// Create a client whose requests time out after `timeout`
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())
            .map_err(|e| ServiceError::Transport(format!("invalid base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::Transport(format!(
                "invalid base URL: {}",
                base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            token: None,
            retry: RetryPolicy::none(),
        })
    }

    /// Authenticate requests with a bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Retry transient GET failures
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The service base URL
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Append `segments` to the base URL, encoding each as a single segment
    ///
    /// Empty, `.` and `..` segments name nothing and are rejected as not found.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(ServiceError::NotFound(format!("invalid path segment '{}'", bad)));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::Transport(format!("invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// GET a JSON resource, retrying transient failures
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &[&str],
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.url(path)?;
        let mut attempt = 0;
        loop {
            match self.get_once(url.clone(), query).await {
                Err(err) if err.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    warn!(
                        url = %url,
                        attempt = attempt,
                        error = %err,
                        "Transient lookup failure, retrying"
                    );
                    tokio::time::sleep(self.retry.backoff * attempt).await;
                }
                result => return result,
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(&self, url: Url, query: &[(&str, &str)]) -> Result<T> {
        debug!(url = %url, "GET");
        let response = self.request(Method::GET, url).query(query).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// POST a JSON body and decode the JSON response
    pub async fn post_json<B, T>(&self, path: &[&str], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        debug!(url = %url, "POST");
        let response = self.request(Method::POST, url).json(body).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// POST a JSON body, ignoring the response body
    pub async fn post<B: Serialize + ?Sized>(&self, path: &[&str], body: &B) -> Result<()> {
        let url = self.url(path)?;
        debug!(url = %url, "POST");
        let response = self.request(Method::POST, url).json(body).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    if status == StatusCode::NOT_FOUND {
        Err(ServiceError::NotFound(message))
    } else {
        Err(ServiceError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

/// Pull a human-readable message out of an error body
///
/// Understands `{"message": ..}`, `{"error": ..}` and
/// `{"errors": [{"message": ..}]}`; falls back to the (truncated) raw body.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let message = value
            .get("message")
            .or_else(|| value.get("error"))
            .or_else(|| value.get("errors").and_then(|e| e.get(0)).and_then(|e| e.get("message")))
            .and_then(|m| m.as_str());
        if let Some(message) = message {
            return Some(message.to_string());
        }
    }

    Some(body.chars().take(MAX_ERROR_BODY).collect())
}
