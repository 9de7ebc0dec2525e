//! Domain layer - Reconciliation and ordering logic.
//!
//! Pure, synchronous code: raw ticker coercion, cross-market
//! reconciliation, derived ratios and the sort engine. No I/O here
//! (hexagonal architecture inner ring).

pub mod entry;
pub mod reconciler;
pub mod sort;
pub mod ticker;

// Re-export core types for convenience
pub use entry::{Ratio, ReconciledEntry};
pub use reconciler::{MarketKind, MarketReconciler, ReconcileStats, Reconciliation};
pub use sort::{SortColumn, SortDirection, SortEngine, SortState, UnknownColumn};
pub use ticker::RawTicker;
