//! Upstream Registry - Verbatim Forwarding to Exchange APIs
//!
//! Looks up a named exchange, enforces its per-second quota, fetches
//! the upstream body and checks it is JSON before handing it back
//! untouched.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use tracing::debug;

use crate::config::ProxyConfig;

/// Why a proxied request failed.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("unknown exchange: {0}")]
    UnknownExchange(String),
    #[error("rate limit exceeded for {0}")]
    RateLimited(String),
    #[error("upstream request to {exchange} failed: {message}")]
    Upstream { exchange: String, message: String },
    #[error("{exchange} returned HTTP {status}")]
    UpstreamStatus { exchange: String, status: u16 },
    #[error("invalid JSON response from {0}")]
    InvalidJson(String),
}

impl ProxyError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownExchange(_) => StatusCode::NOT_FOUND,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream { .. } | Self::UpstreamStatus { .. } | Self::InvalidJson(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}

/// One forwardable exchange endpoint.
struct Upstream {
    url: String,
    limiter: DefaultDirectRateLimiter,
}

/// Named upstreams sharing one HTTP client.
pub struct UpstreamRegistry {
    /// Underlying HTTP client.
    http: Client,
    /// Upstreams keyed by `/api/<name>` segment.
    upstreams: HashMap<String, Upstream>,
    /// User-Agent sent upstream.
    user_agent: String,
}

impl UpstreamRegistry {
    /// Build the registry from proxy configuration.
    pub fn new(config: &ProxyConfig, user_agent: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build proxy HTTP client")?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let upstreams = config
            .upstreams
            .iter()
            .map(|u| {
                let upstream = Upstream {
                    url: u.url.clone(),
                    limiter: RateLimiter::direct(Quota::per_second(per_second)),
                };
                (u.name.clone(), upstream)
            })
            .collect();

        Ok(Self {
            http,
            upstreams,
            user_agent: user_agent.into(),
        })
    }

    /// Configured exchange names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.upstreams.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Whether `exchange` is a configured upstream.
    pub fn contains(&self, exchange: &str) -> bool {
        self.upstreams.contains_key(exchange)
    }

    /// Fetch the upstream body for `exchange`, verbatim.
    pub async fn forward(&self, exchange: &str) -> Result<Bytes, ProxyError> {
        let upstream = self
            .upstreams
            .get(exchange)
            .ok_or_else(|| ProxyError::UnknownExchange(exchange.to_string()))?;

        if upstream.limiter.check().is_err() {
            return Err(ProxyError::RateLimited(exchange.to_string()));
        }

        let upstream_error = |e: reqwest::Error| ProxyError::Upstream {
            exchange: exchange.to_string(),
            message: e.to_string(),
        };

        let response = self
            .http
            .get(&upstream.url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(upstream_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::UpstreamStatus {
                exchange: exchange.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(upstream_error)?;
        if serde_json::from_slice::<serde::de::IgnoredAny>(&body).is_err() {
            return Err(ProxyError::InvalidJson(exchange.to_string()));
        }

        debug!(exchange, bytes = body.len(), "Upstream body forwarded");
        Ok(body)
    }
}
