use async_trait::async_trait;
use clap::Parser;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

/// Submission API connection settings.
#[derive(Parser, Debug, Clone)]
pub struct GatewayEnv {
    /// Base URL every `{iso}/v1/...` path is resolved against
    #[clap(long, env = "SUBMISSION_API_BASE_URL")]
    pub base_url: Url,

    /// Per-request timeout enforced by the HTTP client
    #[clap(long, env, default_value = "30")]
    pub request_timeout_secs: u64,
}

impl GatewayEnv {
    pub fn transport(&self) -> Result<ReqwestTransport, TransportError> {
        ReqwestTransport::new(
            self.base_url.clone(),
            Duration::from_secs(self.request_timeout_secs),
        )
    }
}

/// A settled 2xx response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    /// Parsed JSON, or a JSON string when the body was not JSON. `Null` when empty.
    pub body: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Request failed with status: {status}")]
    Status {
        status: u16,
        content_type: Option<String>,
        body: Option<String>,
    },
    #[error("{message}")]
    Network { message: String },
    #[error("Failed to build HTTP client: {message}")]
    Client { message: String },
}

/// The raw HTTP seam: one POST, failing on anything but 2xx.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
        headers: HeaderMap,
    ) -> Result<HttpReply, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestTransport {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client {
                message: e.to_string(),
            })?;

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn network(error: &reqwest::Error) -> TransportError {
    TransportError::Network {
        message: error.to_string(),
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
        headers: HeaderMap,
    ) -> Result<HttpReply, TransportError> {
        let url = self.url(path);
        debug!("POST {url}");

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("POST {url} failed: {e}");
                network(&e)
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let text = response.text().await.map_err(|e| network(&e))?;

        if !status.is_success() {
            error!("POST {url} returned {status}");
            return Err(TransportError::Status {
                status: status.as_u16(),
                content_type,
                body: (!text.is_empty()).then_some(text),
            });
        }

        let body = if text.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
        };

        Ok(HttpReply {
            status: status.as_u16(),
            body,
        })
    }
}
