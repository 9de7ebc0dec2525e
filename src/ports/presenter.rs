//! Presenter Port - Rendering Interface for the Ticker Board
//!
//! The scheduler hands every presenter an immutable [`Board`] after
//! each commit and each sort change. Presenters never see a dataset
//! mid-update.

use chrono::{DateTime, Local};

use crate::domain::entry::ReconciledEntry;
use crate::domain::sort::SortState;

use super::ticker_source::SourceError;

/// Render-ready view of the scheduler state.
#[derive(Debug, Clone, Copy)]
pub enum Board<'a> {
  /// No cycle has completed yet.
  Loading { sort: SortState },
  /// Last cycle succeeded. `rows` is already in sort order and may be empty.
  Ready {
    rows: &'a [&'a ReconciledEntry],
    refreshed_at: DateTime<Local>,
    sort: SortState,
  },
  /// Last cycle failed; no data is shown.
  Failed {
    error: &'a SourceError,
    failed_at: DateTime<Local>,
    sort: SortState,
  },
}

impl Board<'_> {
  pub const fn sort(&self) -> SortState {
    match self {
      Self::Loading { sort } | Self::Ready { sort, .. } | Self::Failed { sort, .. } => *sort,
    }
  }

  /// Number of rows on display (zero unless `Ready`).
  pub const fn active_pairs(&self) -> usize {
    match self {
      Self::Ready { rows, .. } => rows.len(),
      _ => 0,
    }
  }
}

/// Trait for board renderers (terminal table, JSON snapshot, ...).
pub trait Presenter: Send {
  /// Render the board. Must not fail; renderers log their own I/O errors.
  fn render(&mut self, board: &Board<'_>);
}
