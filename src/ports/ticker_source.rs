//! Ticker Source Port - Exchange Ticker Snapshot Interface
//!
//! Defines the trait the refresh scheduler polls for one batch of raw
//! tickers per cycle, and the two failure kinds a cycle can end in.

use async_trait::async_trait;

use crate::domain::ticker::RawTicker;

/// Why a ticker fetch produced no dataset.
///
/// `Fetch` and `Status` are transport failures; `Parse` means the body
/// arrived but was not a ticker array.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
  /// Network or transport error before a response was read.
  #[error("ticker fetch failed: {0}")]
  Fetch(String),
  /// Source answered with a non-success HTTP status.
  #[error("ticker source returned HTTP {0}")]
  Status(u16),
  /// Response body was not the expected shape.
  #[error("malformed ticker payload: {0}")]
  Parse(String),
}

impl SourceError {
  /// True for transport-level failures (network, HTTP status).
  pub const fn is_fetch_failure(&self) -> bool {
    matches!(self, Self::Fetch(_) | Self::Status(_))
  }

  /// Metric label for the cycle outcome.
  pub const fn outcome_label(&self) -> &'static str {
    if self.is_fetch_failure() {
      "fetch_error"
    } else {
      "parse_error"
    }
  }
}

/// Trait for ticker snapshot providers.
///
/// One call returns the complete, unordered ticker set for a single
/// refresh cycle. Implementors must not retry internally; the next
/// scheduled cycle is the retry.
#[async_trait]
pub trait TickerSource: Send + Sync + 'static {
  /// Fetch every ticker the exchange currently publishes.
  async fn fetch_tickers(&self) -> Result<Vec<RawTicker>, SourceError>;

  /// Human-readable endpoint description for logs.
  fn describe(&self) -> String;
}
