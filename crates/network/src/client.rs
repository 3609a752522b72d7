// crates/network/src/client.rs
//! HTTP client wrapper with resilience

use crate::error::{NetworkError, NetworkResult};
use crate::response::{attachment_filename, HttpResponse};
use measvre_resilience::{retry_async, with_timeout, RetryPolicy};
use reqwest::{multipart, Client as ReqwestClient, RequestBuilder, Url};
use serde::Serialize;
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Deadline for a single attempt, including reading the body
    pub timeout: Duration,
    /// Deadline for establishing a connection
    pub connect_timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Retry policy, `None` for a single attempt
    pub retry_policy: Option<RetryPolicy>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("MeasVRe/{}", env!("CARGO_PKG_VERSION")),
            retry_policy: Some(RetryPolicy::new(3).with_initial_delay(Duration::from_millis(200))),
        }
    }
}

/// HTTP client with timeouts and retry
#[derive(Clone)]
pub struct Client {
    inner: ReqwestClient,
    config: ClientConfig,
}

impl Client {
    /// Creates a new client with default configuration
    pub fn new() -> NetworkResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> NetworkResult<Self> {
        let client = ReqwestClient::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(NetworkError::Http)?;

        Ok(Self {
            inner: client,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Performs a GET request
    pub async fn get(&self, url: &str) -> NetworkResult<HttpResponse> {
        let url = parse_url(url)?;
        self.execute(|| self.inner.get(url.clone())).await
    }

    /// Performs a DELETE request
    pub async fn delete(&self, url: &str) -> NetworkResult<HttpResponse> {
        let url = parse_url(url)?;
        self.execute(|| self.inner.delete(url.clone())).await
    }

    /// Performs a POST request with a JSON body
    pub async fn post_json<T>(&self, url: &str, body: &T) -> NetworkResult<HttpResponse>
    where
        T: Serialize + ?Sized,
    {
        let url = parse_url(url)?;
        self.execute(|| self.inner.post(url.clone()).json(body)).await
    }

    /// Performs a PATCH request with a JSON body
    pub async fn patch_json<T>(&self, url: &str, body: &T) -> NetworkResult<HttpResponse>
    where
        T: Serialize + ?Sized,
    {
        let url = parse_url(url)?;
        self.execute(|| self.inner.patch(url.clone()).json(body)).await
    }

    /// Performs a multipart POST
    ///
    /// Forms cannot be cloned, so `form` is called once per attempt.
    pub async fn post_multipart<F>(&self, url: &str, form: F) -> NetworkResult<HttpResponse>
    where
        F: Fn() -> NetworkResult<multipart::Form>,
    {
        let url = parse_url(url)?;
        let policy = self.policy();
        retry_async(&policy, NetworkError::is_retryable, || async {
            let form = form()?;
            self.attempt(self.inner.post(url.clone()).multipart(form)).await
        })
        .await
    }

    /// Internal request handler with retry
    async fn execute<F>(&self, build: F) -> NetworkResult<HttpResponse>
    where
        F: Fn() -> RequestBuilder,
    {
        let policy = self.policy();
        retry_async(&policy, NetworkError::is_retryable, || self.attempt(build())).await
    }

    /// One bounded attempt; non-2xx statuses become `NetworkError::Status`
    async fn attempt(&self, request: RequestBuilder) -> NetworkResult<HttpResponse> {
        let outcome = with_timeout(self.config.timeout, async {
            let response = request.send().await.map_err(classify)?;
            let status = response.status();
            let filename = attachment_filename(response.headers());
            let body = response.bytes().await.map_err(classify)?;

            if status.is_success() {
                Ok(HttpResponse {
                    status: status.as_u16(),
                    body,
                    filename,
                })
            } else {
                log::debug!("HTTP {} from server", status.as_u16());
                Err(NetworkError::Status {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&body).into_owned(),
                })
            }
        })
        .await;

        match outcome {
            Ok(result) => result,
            Err(_) => Err(NetworkError::Timeout),
        }
    }

    fn policy(&self) -> RetryPolicy {
        self.config
            .retry_policy
            .clone()
            .unwrap_or_else(RetryPolicy::no_retry)
    }
}

fn parse_url(url: &str) -> NetworkResult<Url> {
    Url::parse(url).map_err(|e| NetworkError::InvalidUrl(format!("{}: {}", url, e)))
}

fn classify(e: reqwest::Error) -> NetworkError {
    if e.is_timeout() {
        NetworkError::Timeout
    } else {
        NetworkError::Http(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("MeasVRe/"));
        assert!(config.retry_policy.is_some());
    }

    #[test]
    fn test_client_creation() {
        let client = Client::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_with_custom_config() {
        let config = ClientConfig {
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(1),
            user_agent: "TestAgent".to_string(),
            retry_policy: None,
        };

        let client = Client::with_config(config).unwrap();
        assert_eq!(client.policy().max_attempts(), 1);
    }

    #[test]
    fn test_parse_url_rejects_garbage() {
        assert!(matches!(
            parse_url("not a url"),
            Err(NetworkError::InvalidUrl(_))
        ));
        assert!(parse_url("http://127.0.0.1:5000/measvre-api/projects").is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_is_not_sent() {
        let client = Client::new().unwrap();
        let result = client.get("::::").await;
        assert!(matches!(result, Err(NetworkError::InvalidUrl(_))));
    }
}
