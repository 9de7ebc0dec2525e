//! Ticker HTTP Client - Exchange Ticker Snapshot over REST
//!
//! Wraps reqwest to implement the `TickerSource` port. One GET per
//! cycle, no retries: the scheduler's next tick is the retry.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use tracing::{debug, instrument};

use crate::config::SourceConfig;
use crate::domain::ticker::RawTicker;
use crate::ports::ticker_source::{SourceError, TickerSource};

/// Configuration for the ticker HTTP client.
#[derive(Debug, Clone)]
pub struct TickerClientConfig {
  /// Ticker endpoint: the exchange directly, or the proxy's `/api/<exchange>`.
  pub url: String,
  /// Request timeout.
  pub timeout: Duration,
  /// User-Agent header sent with every request.
  pub user_agent: String,
}

impl Default for TickerClientConfig {
  fn default() -> Self {
    Self {
      url: "https://api.coindcx.com/exchange/ticker".to_string(),
      timeout: Duration::from_secs(10),
      user_agent: concat!("spread-ticker/", env!("CARGO_PKG_VERSION")).to_string(),
    }
  }
}

impl From<&SourceConfig> for TickerClientConfig {
  fn from(config: &SourceConfig) -> Self {
    Self {
      url: config.url.clone(),
      timeout: Duration::from_secs(config.timeout_seconds),
      user_agent: config.user_agent.clone(),
    }
  }
}

/// HTTP implementation of [`TickerSource`].
pub struct TickerClient {
  /// Underlying HTTP client.
  http: Client,
  /// Client configuration.
  config: TickerClientConfig,
}

impl TickerClient {
  /// Create a new ticker client.
  pub fn new(config: TickerClientConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(2)
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self { http, config })
  }

  pub fn url(&self) -> &str {
    &self.config.url
  }
}

#[async_trait]
impl TickerSource for TickerClient {
  #[instrument(skip_all)]
  async fn fetch_tickers(&self) -> Result<Vec<RawTicker>, SourceError> {
    let response = self
      .http
      .get(&self.config.url)
      .header(USER_AGENT, &self.config.user_agent)
      .header(ACCEPT, "application/json")
      .send()
      .await
      .map_err(|e| SourceError::Fetch(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      return Err(SourceError::Status(status.as_u16()));
    }

    let body = response
      .bytes()
      .await
      .map_err(|e| SourceError::Fetch(e.to_string()))?;

    let tickers = parse_tickers(&body)?;
    debug!(
      url = %self.config.url,
      records = tickers.len(),
      bytes = body.len(),
      "Ticker batch received"
    );
    Ok(tickers)
  }

  fn describe(&self) -> String {
    self.config.url.clone()
  }
}

/// Decode a ticker response body: a JSON array of ticker objects.
pub fn parse_tickers(body: &[u8]) -> Result<Vec<RawTicker>, SourceError> {
  serde_json::from_slice(body).map_err(|e| SourceError::Parse(e.to_string()))
}
