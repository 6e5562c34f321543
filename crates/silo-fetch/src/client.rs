//! HTTP transport against the data API.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{Client, Response, Url};
use serde_json::Value;
use silo_types::{ApiConfig, Params, Result, SiloError};

/// Header carrying the static API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum concurrent partition fetches.
    pub concurrency: usize,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            timeout: Duration::from_secs(60),
            user_agent: format!("silo/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP client with connection pooling and API-key authentication.
///
/// Buffered and streamed response bodies are separate entry points; the
/// caller chooses the mode up front.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    api: ApiConfig,
    config: ClientConfig,
}

impl ApiClient {
    /// Creates a new client for the given API.
    ///
    /// # Errors
    ///
    /// Returns [`SiloError::Config`] if the configured host is not a valid
    /// URL, or [`SiloError::Transport`] if the HTTP client cannot be built.
    pub fn new(api: ApiConfig, config: ClientConfig) -> Result<Self> {
        Url::parse(&api.host)
            .map_err(|e| SiloError::Config(format!("invalid API host '{}': {e}", api.host)))?;

        let http = Client::builder()
            .pool_max_idle_per_host(config.concurrency)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()
            .map_err(transport_err)?;

        Ok(Self { http, api, config })
    }

    /// Creates a client with default transport settings.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`new`](Self::new).
    pub fn with_defaults(api: ApiConfig) -> Result<Self> {
        Self::new(api, ClientConfig::default())
    }

    /// Returns the transport configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the API configuration.
    #[must_use]
    pub const fn api(&self) -> &ApiConfig {
        &self.api
    }

    /// Builds the full request URL for `path`, omitting `null`-valued
    /// parameters from the query string.
    ///
    /// # Errors
    ///
    /// Returns [`SiloError::Transport`] if host and path do not combine into
    /// a valid URL.
    pub fn endpoint_url(&self, path: &str, params: &Params) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.api.host, path))
            .map_err(|e| SiloError::Transport(e.to_string()))?;
        let pairs = params.query_pairs();
        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in &pairs {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Issues the GET and checks the response status.
    ///
    /// 5xx bodies are logged before the error is returned so server-side
    /// diagnostics are not lost.
    async fn send(&self, path: &str, params: &Params) -> Result<Response> {
        let url = self.endpoint_url(path, params)?;
        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.api.api_key)
            .send()
            .await
            .map_err(transport_err)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                tracing::error!(status = status.as_u16(), %body, "server error response");
            }
            return Err(SiloError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Fetches a JSON body, buffered, returning the payload and response
    /// headers.
    ///
    /// # Errors
    ///
    /// Returns [`SiloError::Http`] on a non-success status or
    /// [`SiloError::Transport`] if the body is not valid JSON.
    pub async fn get_json(&self, path: &str, params: &Params) -> Result<(Value, HeaderMap)> {
        let response = self.send(path, params).await?;
        let headers = response.headers().clone();
        let value = response.json().await.map_err(transport_err)?;
        Ok((value, headers))
    }

    /// Fetches a raw body, buffered.
    ///
    /// # Errors
    ///
    /// Returns [`SiloError::Http`] on a non-success status.
    pub async fn get_bytes(&self, path: &str, params: &Params) -> Result<Bytes> {
        let response = self.send(path, params).await?;
        response.bytes().await.map_err(transport_err)
    }

    /// Fetches with a streamed body, returning the response after the
    /// status check so the caller can consume it chunk by chunk.
    ///
    /// # Errors
    ///
    /// Returns [`SiloError::Http`] on a non-success status.
    pub async fn get_streaming(&self, path: &str, params: &Params) -> Result<Response> {
        self.send(path, params).await
    }
}

pub(crate) fn transport_err(e: reqwest::Error) -> SiloError {
    SiloError::Transport(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn test_client() -> ApiClient {
        let api = ApiConfig::new("https://api.example.com", "k", "/tmp/silo");
        ApiClient::with_defaults(api).unwrap()
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_endpoint_url() {
        let client = test_client();
        let params = Params::new().with("ccy", "eur").with("mod_20", 3);
        let url = client.endpoint_url("partitions/reports", &params).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/partitions/reports?ccy=eur&mod_20=3"
        );
    }

    #[test]
    fn test_endpoint_url_omits_null_params() {
        let client = test_client();
        let params = Params::new()
            .with("from", "2019-01-01")
            .with("to", Value::Null);
        let url = client.endpoint_url("data/timeseries", &params).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/data/timeseries?from=2019-01-01"
        );
    }

    #[test]
    fn test_endpoint_url_encodes_values() {
        let client = test_client();
        let params = Params::new().with("periods", "one-day,one-week");
        let url = client.endpoint_url("data/reports", &params).unwrap();
        assert!(url.as_str().contains("periods=one-day%2Cone-week"));
    }

    #[test]
    fn test_invalid_host_rejected() {
        let api = ApiConfig::new("not a url", "k", "/tmp/silo");
        let err = ApiClient::with_defaults(api).unwrap_err();
        assert!(matches!(err, SiloError::Config(_)));
    }
}
