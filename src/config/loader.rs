//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Default config path when none is given.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Env var naming an alternative config path.
pub const CONFIG_PATH_ENV: &str = "SPREAD_TICKER_CONFIG";

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config = parse_config(&content)?;

  info!(
    path = %path.display(),
    source = %config.source.url,
    interval_s = config.refresh.interval_seconds,
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content).context("Failed to parse config.toml")?;
  validate_config(&config)?;
  Ok(config)
}

/// Resolve the config path and load it.
///
/// An explicit path (argument or env var) must exist. The default
/// `config.toml` is optional: when absent, built-in defaults apply.
pub fn load_from_env(cli_path: Option<String>) -> Result<AppConfig> {
  let explicit = cli_path.or_else(|| std::env::var(CONFIG_PATH_ENV).ok());

  match explicit {
    Some(path) => load_config(&path),
    None if Path::new(DEFAULT_CONFIG_PATH).exists() => load_config(DEFAULT_CONFIG_PATH),
    None => {
      let config = AppConfig::default();
      validate_config(&config)?;
      Ok(config)
    }
  }
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Non-empty, distinct market suffixes
/// - Positive intervals and timeouts
/// - Well-formed, uniquely named proxy upstreams
fn validate_config(config: &AppConfig) -> Result<()> {
  // Market validation
  let markets = &config.markets;
  anyhow::ensure!(
    !markets.local_suffix.is_empty() && !markets.stable_suffix.is_empty(),
    "Market suffixes must not be empty"
  );
  anyhow::ensure!(
    markets.local_suffix != markets.stable_suffix,
    "local_suffix and stable_suffix must differ, both are {}",
    markets.local_suffix
  );

  // Source validation
  anyhow::ensure!(
    !config.source.url.is_empty(),
    "Ticker source URL must not be empty"
  );
  anyhow::ensure!(
    config.source.timeout_seconds >= 1,
    "source.timeout_seconds must be at least 1"
  );

  // Refresh validation
  anyhow::ensure!(
    config.refresh.interval_seconds >= 1,
    "refresh.interval_seconds must be at least 1, got {}",
    config.refresh.interval_seconds
  );

  // Proxy validation
  let proxy = &config.proxy;
  anyhow::ensure!(
    proxy.requests_per_second > 0,
    "proxy.requests_per_second must be positive"
  );
  anyhow::ensure!(
    proxy.timeout_seconds >= 1,
    "proxy.timeout_seconds must be at least 1"
  );

  let mut names = HashSet::new();
  for (i, upstream) in proxy.upstreams.iter().enumerate() {
    anyhow::ensure!(
      !upstream.name.is_empty() && !upstream.name.contains('/'),
      "Upstream {} has an invalid name: {:?}",
      i,
      upstream.name
    );
    anyhow::ensure!(
      !upstream.url.is_empty(),
      "Upstream {} ({}) has empty url",
      i,
      upstream.name
    );
    anyhow::ensure!(
      names.insert(upstream.name.as_str()),
      "Upstream name {} is configured twice",
      upstream.name
    );
  }

  Ok(())
}
