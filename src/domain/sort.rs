//! Sort Engine - User-Controlled Ordering of the Reconciled Set
//!
//! Holds the active column and direction across refreshes and
//! produces a freshly ordered view of whatever dataset is committed.
//!
//! Comparison rules:
//! - numeric columns compare with `f64::total_cmp`
//! - ratio columns compare numerically, undefined ratios rank above
//!   every defined value (last when ascending, first when descending)
//! - text columns compare lexicographically by byte
//!
//! The sort is stable and descending reverses the comparator, so ties
//! always keep discovery order.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::entry::{Ratio, ReconciledEntry};

/// Sortable fields of a [`ReconciledEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    SequenceNumber,
    PairSymbol,
    LocalBid,
    LocalAsk,
    LocalVolume,
    StableBid,
    StableAsk,
    LastUpdated,
    BuyRatio,
    SellRatio,
}

impl SortColumn {
    pub const ALL: [Self; 10] = [
        Self::SequenceNumber,
        Self::PairSymbol,
        Self::LocalBid,
        Self::LocalAsk,
        Self::LocalVolume,
        Self::StableBid,
        Self::StableAsk,
        Self::LastUpdated,
        Self::BuyRatio,
        Self::SellRatio,
    ];

    /// Stable snake_case key, identical to the serde representation.
    pub const fn key(self) -> &'static str {
        match self {
            Self::SequenceNumber => "sequence_number",
            Self::PairSymbol => "pair_symbol",
            Self::LocalBid => "local_bid",
            Self::LocalAsk => "local_ask",
            Self::LocalVolume => "local_volume",
            Self::StableBid => "stable_bid",
            Self::StableAsk => "stable_ask",
            Self::LastUpdated => "last_updated",
            Self::BuyRatio => "buy_ratio",
            Self::SellRatio => "sell_ratio",
        }
    }

    /// Compare two entries on this column, ascending.
    pub fn compare(self, a: &ReconciledEntry, b: &ReconciledEntry) -> Ordering {
        match self {
            Self::SequenceNumber => a.sequence_number.cmp(&b.sequence_number),
            Self::PairSymbol => a.pair_symbol.cmp(&b.pair_symbol),
            Self::LocalBid => a.local_bid.total_cmp(&b.local_bid),
            Self::LocalAsk => a.local_ask.total_cmp(&b.local_ask),
            Self::LocalVolume => a.local_volume.total_cmp(&b.local_volume),
            Self::StableBid => a.stable_bid.total_cmp(&b.stable_bid),
            Self::StableAsk => a.stable_ask.total_cmp(&b.stable_ask),
            Self::LastUpdated => a.last_updated.cmp(&b.last_updated),
            Self::BuyRatio => compare_ratio(a.buy_ratio, b.buy_ratio),
            Self::SellRatio => compare_ratio(a.sell_ratio, b.sell_ratio),
        }
    }
}

fn compare_ratio(a: Ratio, b: Ratio) -> Ordering {
    match (a, b) {
        (Ratio::Defined(x), Ratio::Defined(y)) => x.total_cmp(&y),
        (Ratio::Defined(_), Ratio::Undefined) => Ordering::Less,
        (Ratio::Undefined, Ratio::Defined(_)) => Ordering::Greater,
        (Ratio::Undefined, Ratio::Undefined) => Ordering::Equal,
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Error returned when a column name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort column: {0}")]
pub struct UnknownColumn(pub String);

impl FromStr for SortColumn {
    type Err = UnknownColumn;

    /// Accepts the snake_case key, the camelCase field name, or the
    /// table header label, ignoring case and a trailing sort marker.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s
            .trim()
            .trim_end_matches(['↑', '↓', ' '])
            .to_ascii_lowercase();

        let column = match normalised.as_str() {
            "sequence_number" | "sequencenumber" | "srno" | "sr. no" | "sr. no." | "#" => {
                Self::SequenceNumber
            }
            "pair_symbol" | "pairsymbol" | "pair" => Self::PairSymbol,
            "local_bid" | "localbid" | "inrbid" | "inr bid" => Self::LocalBid,
            "local_ask" | "localask" | "inrask" | "inr ask" => Self::LocalAsk,
            "local_volume" | "localvolume" | "inrvolume" | "volume" => Self::LocalVolume,
            "stable_bid" | "stablebid" | "usdtbid" | "usdt bid" => Self::StableBid,
            "stable_ask" | "stableask" | "usdtask" | "usdt ask" => Self::StableAsk,
            "last_updated" | "lastupdated" | "last updated" => Self::LastUpdated,
            "buy_ratio" | "buyratio" | "buyrange" | "buy range" => Self::BuyRatio,
            "sell_ratio" | "sellratio" | "sellrange" | "sell range" => Self::SellRatio,
            _ => return Err(UnknownColumn(s.to_string())),
        };
        Ok(column)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    pub const fn arrow(self) -> &'static str {
        match self {
            Self::Ascending => "↑",
            Self::Descending => "↓",
        }
    }
}

/// Active sort column and direction. Lives for the whole process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub active_column: Option<SortColumn>,
    pub direction: SortDirection,
}

/// Owns the [`SortState`] and orders datasets on demand.
#[derive(Debug, Clone, Default)]
pub struct SortEngine {
    state: SortState,
}

impl SortEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn state(&self) -> SortState {
        self.state
    }

    /// Select a column: same column flips direction, a new column
    /// becomes active in ascending order.
    pub fn select_column(&mut self, column: SortColumn) -> SortState {
        if self.state.active_column == Some(column) {
            self.state.direction = self.state.direction.flipped();
        } else {
            self.state = SortState {
                active_column: Some(column),
                direction: SortDirection::Ascending,
            };
        }
        self.state
    }

    /// Ordered view over `dataset`; the dataset itself is untouched.
    pub fn ordered_view<'a>(&self, dataset: &'a [ReconciledEntry]) -> Vec<&'a ReconciledEntry> {
        let mut view: Vec<&ReconciledEntry> = dataset.iter().collect();
        let Some(column) = self.state.active_column else {
            return view;
        };

        match self.state.direction {
            SortDirection::Ascending => view.sort_by(|a, b| column.compare(a, b)),
            SortDirection::Descending => view.sort_by(|a, b| column.compare(b, a)),
        }
        view
    }
}
