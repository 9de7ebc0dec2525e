//! Configuration Module - TOML-based Ticker Configuration
//!
//! Loads and validates configuration from `config.toml`. Every
//! section has defaults, so an empty file (or none at all) yields a
//! working CoinDCX INR/USDT setup.

pub mod loader;

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  /// Process identity, logging and terminal output.
  pub app: AppSection,
  /// Ticker endpoint polled every cycle.
  pub source: SourceConfig,
  /// Market suffixes to reconcile.
  pub markets: MarketsConfig,
  /// Refresh cadence.
  pub refresh: RefreshConfig,
  /// CORS proxy and board API.
  pub proxy: ProxyConfig,
  /// Metrics and health endpoints.
  pub metrics: MetricsConfig,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
  #[default]
  Json,
  Compact,
  Pretty,
}

/// Process identity configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
  /// Human-readable instance name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  pub log_level: String,
  /// Log output format.
  pub log_format: LogFormat,
  /// Print the table to stdout after every render.
  pub render_table: bool,
}

impl Default for AppSection {
  fn default() -> Self {
    Self {
      name: "spread-ticker".to_string(),
      log_level: default_log_level(),
      log_format: LogFormat::Json,
      render_table: true,
    }
  }
}

/// Ticker source configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
  /// Ticker endpoint (exchange or proxy path).
  pub url: String,
  /// Request timeout in seconds.
  pub timeout_seconds: u64,
  /// User-Agent header.
  pub user_agent: String,
}

impl Default for SourceConfig {
  fn default() -> Self {
    Self {
      url: "https://api.coindcx.com/exchange/ticker".to_string(),
      timeout_seconds: 10,
      user_agent: default_user_agent(),
    }
  }
}

/// Market suffix configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketsConfig {
  /// Suffix of local-currency markets (e.g. "INR").
  pub local_suffix: String,
  /// Suffix of stablecoin markets (e.g. "USDT").
  pub stable_suffix: String,
}

impl Default for MarketsConfig {
  fn default() -> Self {
    Self {
      local_suffix: "INR".to_string(),
      stable_suffix: "USDT".to_string(),
    }
  }
}

/// Refresh cadence configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
  /// Seconds between scheduled cycles.
  pub interval_seconds: u64,
}

impl Default for RefreshConfig {
  fn default() -> Self {
    Self {
      interval_seconds: 10,
    }
  }
}

/// A named upstream the proxy forwards to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpstreamConfig {
  /// Path segment under `/api/`.
  pub name: String,
  /// Upstream URL fetched verbatim.
  pub url: String,
}

impl UpstreamConfig {
  fn new(name: &str, url: &str) -> Self {
    Self {
      name: name.to_string(),
      url: url.to_string(),
    }
  }
}

/// CORS proxy configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
  /// Serve the proxy and board API.
  pub enabled: bool,
  /// Bind address.
  pub bind_address: String,
  /// Upstream requests allowed per second, per exchange.
  pub requests_per_second: u32,
  /// Upstream request timeout in seconds.
  pub timeout_seconds: u64,
  /// Exchanges reachable at `/api/<name>`.
  pub upstreams: Vec<UpstreamConfig>,
}

impl Default for ProxyConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      bind_address: "0.0.0.0:3000".to_string(),
      requests_per_second: 5,
      timeout_seconds: 10,
      upstreams: vec![
        UpstreamConfig::new("coindcx", "https://api.coindcx.com/exchange/ticker"),
        UpstreamConfig::new("wazirx", "https://api.wazirx.com/api/v2/tickers"),
        UpstreamConfig::new("binance", "https://api.binance.com/api/v3/ticker/24hr"),
      ],
    }
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  pub enabled: bool,
  /// Metrics server bind address.
  pub bind_address: String,
  /// Health check endpoint port.
  pub health_port: u16,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      bind_address: "0.0.0.0:9090".to_string(),
      health_port: 8080,
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_user_agent() -> String {
  "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
    .to_string()
}
