//! Application State - Committed Dataset and Sort State
//!
//! The single owner of everything the board shows: the dataset from
//! the last completed cycle and the user's sort selection. Owned by
//! the refresh scheduler and only ever mutated from its task.

use chrono::{DateTime, Local};

use crate::domain::entry::ReconciledEntry;
use crate::domain::sort::{SortColumn, SortEngine, SortState};
use crate::ports::presenter::{Board, Presenter};
use crate::ports::ticker_source::SourceError;

/// Outcome of the most recent refresh cycle.
#[derive(Debug, Clone, Default)]
pub enum DatasetState {
  /// Nothing committed yet.
  #[default]
  Loading,
  /// Last cycle succeeded. An empty dataset is a valid outcome.
  Ready {
    entries: Vec<ReconciledEntry>,
    refreshed_at: DateTime<Local>,
  },
  /// Last cycle failed. The previous dataset is gone, not kept as fallback.
  Failed {
    error: SourceError,
    failed_at: DateTime<Local>,
  },
}

/// Dataset plus sort state, replaced wholesale per cycle.
#[derive(Debug, Default)]
pub struct AppState {
  dataset: DatasetState,
  sort: SortEngine,
}

impl AppState {
  pub fn new() -> Self {
    Self::default()
  }

  /// Replace the dataset with a successful cycle's entries.
  pub fn commit(&mut self, entries: Vec<ReconciledEntry>, refreshed_at: DateTime<Local>) {
    self.dataset = DatasetState::Ready {
      entries,
      refreshed_at,
    };
  }

  /// Replace the dataset with a failure state.
  pub fn fail(&mut self, error: SourceError, failed_at: DateTime<Local>) {
    self.dataset = DatasetState::Failed { error, failed_at };
  }

  /// Apply a sort-column selection. Does not touch the dataset.
  pub fn select_column(&mut self, column: SortColumn) -> SortState {
    self.sort.select_column(column)
  }

  pub const fn dataset(&self) -> &DatasetState {
    &self.dataset
  }

  pub const fn sort_state(&self) -> SortState {
    self.sort.state()
  }

  /// Entries of the committed dataset, empty unless `Ready`.
  pub fn entries(&self) -> &[ReconciledEntry] {
    match &self.dataset {
      DatasetState::Ready { entries, .. } => entries,
      _ => &[],
    }
  }

  /// Committed entries in the current sort order.
  pub fn ordered_view(&self) -> Vec<&ReconciledEntry> {
    self.sort.ordered_view(self.entries())
  }

  /// Build the board once and hand it to every presenter.
  pub fn render_to(&self, presenters: &mut [Box<dyn Presenter>]) {
    let sort = self.sort.state();
    let rows = self.ordered_view();
    let board = match &self.dataset {
      DatasetState::Loading => Board::Loading { sort },
      DatasetState::Ready { refreshed_at, .. } => Board::Ready {
        rows: &rows,
        refreshed_at: *refreshed_at,
        sort,
      },
      DatasetState::Failed { error, failed_at } => Board::Failed {
        error,
        failed_at: *failed_at,
        sort,
      },
    };

    for presenter in presenters.iter_mut() {
      presenter.render(&board);
    }
  }
}
