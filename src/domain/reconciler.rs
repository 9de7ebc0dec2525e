//! Market Reconciler - Pairs Local-Currency and Stablecoin Markets
//!
//! Splits a raw ticker batch into two markets keyed by base symbol,
//! joins them, drops dead pairs, and derives the buy/sell ratios.
//! Pure function of its input: no I/O, no state carried across cycles.

use std::collections::HashMap;

use serde::Serialize;

use super::entry::{Ratio, ReconciledEntry};
use super::ticker::{RawTicker, format_local_time};

/// Which side of the reconciliation a market belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketKind {
    /// Quoted in the region's fiat currency (e.g. INR).
    Local,
    /// Quoted in a USD-pegged stable asset (e.g. USDT).
    Stable,
}

/// Counters describing one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    /// Records in the raw batch.
    pub records: usize,
    /// Distinct local-currency base symbols.
    pub local_markets: usize,
    /// Distinct stablecoin base symbols.
    pub stable_markets: usize,
    /// Records whose suffix matched neither market.
    pub unrecognised: usize,
    /// Local base symbols with no stablecoin counterpart.
    pub unmatched: usize,
    /// Matched pairs dropped for lacking a positive quote on a side.
    pub rejected: usize,
}

/// Output of [`MarketReconciler::reconcile`].
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// Entries in discovery order, numbered 1..N.
    pub entries: Vec<ReconciledEntry>,
    pub stats: ReconcileStats,
}

/// Base-symbol index preserving first-seen order; later records replace
/// earlier ones without moving them.
#[derive(Default)]
struct BaseIndex<'a> {
    order: Vec<&'a str>,
    records: HashMap<&'a str, &'a RawTicker>,
}

impl<'a> BaseIndex<'a> {
    fn insert(&mut self, base: &'a str, ticker: &'a RawTicker) {
        if self.records.insert(base, ticker).is_none() {
            self.order.push(base);
        }
    }

    fn get(&self, base: &str) -> Option<&'a RawTicker> {
        self.records.get(base).copied()
    }

    fn iter(&self) -> impl Iterator<Item = (&'a str, &'a RawTicker)> + '_ {
        self.order.iter().map(|base| (*base, self.records[base]))
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Joins a local-currency market to a stablecoin market by base symbol.
#[derive(Debug, Clone)]
pub struct MarketReconciler {
    local_suffix: String,
    stable_suffix: String,
}

impl Default for MarketReconciler {
    fn default() -> Self {
        Self::new("INR", "USDT")
    }
}

impl MarketReconciler {
    pub fn new(local_suffix: impl Into<String>, stable_suffix: impl Into<String>) -> Self {
        Self {
            local_suffix: local_suffix.into(),
            stable_suffix: stable_suffix.into(),
        }
    }

    pub fn local_suffix(&self) -> &str {
        &self.local_suffix
    }

    pub fn stable_suffix(&self) -> &str {
        &self.stable_suffix
    }

    /// Classify a market symbol and strip its suffix.
    ///
    /// The stablecoin suffix is tried first. Returns `None` for
    /// unrecognised suffixes and for a bare suffix with no base.
    pub fn classify<'m>(&self, market: &'m str) -> Option<(MarketKind, &'m str)> {
        let (kind, base) = if let Some(base) = market.strip_suffix(self.stable_suffix.as_str()) {
            (MarketKind::Stable, base)
        } else {
            (MarketKind::Local, market.strip_suffix(self.local_suffix.as_str())?)
        };
        (!base.is_empty()).then_some((kind, base))
    }

    /// Run one reconciliation pass over a raw ticker batch.
    pub fn reconcile(&self, tickers: &[RawTicker]) -> Reconciliation {
        let mut stats = ReconcileStats {
            records: tickers.len(),
            ..ReconcileStats::default()
        };
        let mut local = BaseIndex::default();
        let mut stable = BaseIndex::default();

        for ticker in tickers {
            match self.classify(&ticker.market) {
                Some((MarketKind::Local, base)) => local.insert(base, ticker),
                Some((MarketKind::Stable, base)) => stable.insert(base, ticker),
                None => stats.unrecognised += 1,
            }
        }
        stats.local_markets = local.len();
        stats.stable_markets = stable.len();

        let mut entries = Vec::with_capacity(local.len().min(stable.len()));
        for (base, local_ticker) in local.iter() {
            let Some(stable_ticker) = stable.get(base) else {
                stats.unmatched += 1;
                continue;
            };

            if !has_live_quote(local_ticker) || !has_live_quote(stable_ticker) {
                stats.rejected += 1;
                continue;
            }

            entries.push(ReconciledEntry {
                sequence_number: 0,
                pair_symbol: local_ticker.market.clone(),
                local_bid: local_ticker.bid,
                local_ask: local_ticker.ask,
                local_volume: local_ticker.volume,
                stable_bid: stable_ticker.bid,
                stable_ask: stable_ticker.ask,
                last_updated: format_local_time(local_ticker.timestamp),
                buy_ratio: Ratio::between(local_ticker.ask, stable_ticker.ask),
                sell_ratio: Ratio::between(local_ticker.bid, stable_ticker.bid),
            });
        }

        for (sequence, entry) in (1u32..).zip(entries.iter_mut()) {
            entry.sequence_number = sequence;
        }

        Reconciliation { entries, stats }
    }
}

/// At least one of bid/ask is strictly positive.
fn has_live_quote(ticker: &RawTicker) -> bool {
    ticker.bid > 0.0 || ticker.ask > 0.0
}
