//! Reconciled cross-market entries and their derived ratios.

use std::fmt;

use serde::{Serialize, Serializer};

/// Placeholder shown for a ratio whose denominator is zero.
pub const UNDEFINED_RATIO_DISPLAY: &str = "—";

/// Dimensionless cross-market price ratio.
///
/// A ratio is `Undefined` when the stablecoin-side denominator is not
/// strictly positive; NaN and infinity never escape this type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    /// Quotient rounded to two decimal places.
    Defined(f64),
    /// Denominator was zero.
    Undefined,
}

impl Ratio {
    /// Divide `numerator` by `denominator`, rounding to 2 decimals.
    pub fn between(numerator: f64, denominator: f64) -> Self {
        if denominator <= 0.0 {
            return Self::Undefined;
        }
        let rounded = (numerator / denominator * 100.0).round() / 100.0;
        if rounded.is_finite() {
            Self::Defined(rounded)
        } else {
            Self::Undefined
        }
    }

    /// Numeric value, if defined.
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Defined(v) => Some(v),
            Self::Undefined => None,
        }
    }

    pub const fn is_defined(self) -> bool {
        matches!(self, Self::Defined(_))
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defined(v) => write!(f, "{v:.2}"),
            Self::Undefined => f.write_str(UNDEFINED_RATIO_DISPLAY),
        }
    }
}

impl Serialize for Ratio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

/// One base asset listed in both the local-currency and stablecoin markets.
///
/// Built fresh on every refresh cycle and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledEntry {
    /// 1-based position in discovery order. Not stable across cycles.
    pub sequence_number: u32,
    /// Local-currency market symbol, e.g. `"BTCINR"`.
    pub pair_symbol: String,
    pub local_bid: f64,
    pub local_ask: f64,
    pub local_volume: f64,
    pub stable_bid: f64,
    pub stable_ask: f64,
    /// Local wall-clock time of the local-market record.
    pub last_updated: String,
    /// `local_ask / stable_ask`.
    pub buy_ratio: Ratio,
    /// `local_bid / stable_bid`.
    pub sell_ratio: Ratio,
}
