//! Board Publisher - Snapshot Channel for the Browser Board
//!
//! Converts each rendered board into an owned, serializable snapshot
//! and swaps it into a `tokio::sync::watch` channel. Readers (the
//! `/board` route) always get a whole snapshot, never a torn one.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::domain::entry::ReconciledEntry;
use crate::domain::sort::SortState;
use crate::ports::presenter::{Board, Presenter};

/// Board status as seen by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardStatus {
    Loading,
    Ready,
    Empty,
    Error,
}

/// One table row, numbers plus their display strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardRow {
    #[serde(flatten)]
    pub entry: ReconciledEntry,
    pub buy_ratio_display: String,
    pub sell_ratio_display: String,
}

impl From<&ReconciledEntry> for BoardRow {
    fn from(entry: &ReconciledEntry) -> Self {
        Self {
            entry: entry.clone(),
            buy_ratio_display: entry.buy_ratio.to_string(),
            sell_ratio_display: entry.sell_ratio.to_string(),
        }
    }
}

/// Owned, serializable copy of a [`Board`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardSnapshot {
    pub status: BoardStatus,
    pub rows: Vec<BoardRow>,
    pub active_pairs: usize,
    /// RFC 3339 time of the last successful refresh.
    pub last_refresh: Option<String>,
    pub sort: SortState,
    pub error: Option<String>,
}

impl BoardSnapshot {
    pub fn loading() -> Self {
        Self {
            status: BoardStatus::Loading,
            rows: Vec::new(),
            active_pairs: 0,
            last_refresh: None,
            sort: SortState::default(),
            error: None,
        }
    }
}

impl From<&Board<'_>> for BoardSnapshot {
    fn from(board: &Board<'_>) -> Self {
        let mut snapshot = Self {
            sort: board.sort(),
            ..Self::loading()
        };
        match board {
            Board::Loading { .. } => {}
            Board::Ready {
                rows, refreshed_at, ..
            } => {
                snapshot.status = if rows.is_empty() {
                    BoardStatus::Empty
                } else {
                    BoardStatus::Ready
                };
                snapshot.rows = rows.iter().map(|e| BoardRow::from(*e)).collect();
                snapshot.active_pairs = rows.len();
                snapshot.last_refresh = Some(refreshed_at.to_rfc3339());
            }
            Board::Failed { error, .. } => {
                snapshot.status = BoardStatus::Error;
                snapshot.error = Some(error.to_string());
            }
        }
        snapshot
    }
}

/// Publishes every rendered board into a watch channel.
pub struct BoardPublisher {
    board_tx: watch::Sender<Arc<BoardSnapshot>>,
}

impl BoardPublisher {
    /// Create a publisher and the receiver consumers read from.
    pub fn new() -> (Self, watch::Receiver<Arc<BoardSnapshot>>) {
        let (board_tx, board_rx) = watch::channel(Arc::new(BoardSnapshot::loading()));
        (Self { board_tx }, board_rx)
    }
}

impl Presenter for BoardPublisher {
    fn render(&mut self, board: &Board<'_>) {
        self.board_tx.send_replace(Arc::new(BoardSnapshot::from(board)));
    }
}
