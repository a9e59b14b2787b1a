//! PATCH /features transport and HTTP status classification

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;

use super::models::FeatureCollection;
use crate::config::ApiConfig;

/// Header carrying the Vetro API token
pub const TOKEN_HEADER: &str = "Token";

/// Body of a successful response; JSON when it parses, raw text otherwise
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    pub fn parse(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(json) => ResponseBody::Json(json),
            Err(_) => ResponseBody::Text(text),
        }
    }
}

/// Outcome of a single PATCH call
#[derive(Debug, Clone, PartialEq)]
pub enum TransportOutcome {
    Success { status: u16, body: ResponseBody },
    /// 429 Too Many Requests
    RateLimited,
    /// 5xx
    ServerError { status: u16 },
    /// Any other non-success status
    ClientError { status: u16, body: String },
    /// Connection error or timeout; no status received
    NetworkFailure { cause: String },
}

impl TransportOutcome {
    /// Map an HTTP status and body to an outcome
    pub fn classify(status: u16, body: String) -> Self {
        match status {
            200..=299 => TransportOutcome::Success {
                status,
                body: ResponseBody::parse(body),
            },
            429 => TransportOutcome::RateLimited,
            500..=599 => TransportOutcome::ServerError { status },
            _ => TransportOutcome::ClientError { status, body },
        }
    }
}

/// Sends one batch of features to the remote service
#[async_trait]
pub trait Transport: Send + Sync {
    async fn patch_features(&self, payload: &FeatureCollection) -> TransportOutcome;
}

/// reqwest-backed transport for the Vetro v3 API
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    features_url: String,
}

impl HttpTransport {
    /// Build a transport with the token header and request timeout applied
    pub fn new(config: &ApiConfig, api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut token = HeaderValue::from_str(api_key).context("API key contains invalid characters")?;
        token.set_sensitive(true);
        headers.insert(TOKEN_HEADER, token);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            features_url: format!("{}/features", config.base_url.trim_end_matches('/')),
        })
    }

    pub fn features_url(&self) -> &str {
        &self.features_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn patch_features(&self, payload: &FeatureCollection) -> TransportOutcome {
        log::debug!("PATCH {} with {} features", self.features_url, payload.len());

        let response = match self.client.patch(&self.features_url).json(payload).send().await {
            Ok(response) => response,
            Err(e) => {
                return TransportOutcome::NetworkFailure {
                    cause: e.to_string(),
                };
            }
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => TransportOutcome::classify(status, body),
            // Body cut off mid-read (including timeouts) is a network failure
            Err(e) => TransportOutcome::NetworkFailure {
                cause: e.to_string(),
            },
        }
    }
}
