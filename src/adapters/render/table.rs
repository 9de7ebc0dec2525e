//! Text Table Renderer - Terminal Presentation of the Board
//!
//! Writes one full table per render: header with sort marker, one row
//! per entry, and a footer with refresh time and pair count. Error and
//! empty states get their own single-row bodies.

use std::fmt::Write as _;
use std::io::Write;

use tracing::warn;

use crate::domain::entry::ReconciledEntry;
use crate::domain::sort::{SortColumn, SortState};
use crate::ports::presenter::{Board, Presenter};

/// ANSI clear-screen + cursor-home.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub const ERROR_MESSAGE: &str = "Error fetching data. Please try again later.";
pub const EMPTY_MESSAGE: &str = "No active trading pairs found";
pub const LOADING_MESSAGE: &str = "Loading ticker data...";

/// Displayed columns and their widths.
const COLUMNS: [(SortColumn, usize); 7] = [
    (SortColumn::SequenceNumber, 7),
    (SortColumn::PairSymbol, 14),
    (SortColumn::LocalBid, 18),
    (SortColumn::LocalAsk, 18),
    (SortColumn::LocalVolume, 18),
    (SortColumn::BuyRatio, 11),
    (SortColumn::SellRatio, 11),
];

/// Renders the board as a fixed-width text table.
pub struct TableRenderer<W: Write + Send> {
    out: W,
    /// Local-currency label for headers (e.g. "INR").
    local: String,
    /// Stablecoin label for the legend (e.g. "USDT").
    stable: String,
    /// Clear the terminal before each render.
    clear_screen: bool,
}

impl<W: Write + Send> TableRenderer<W> {
    pub fn new(out: W, local: impl Into<String>, stable: impl Into<String>) -> Self {
        Self {
            out,
            local: local.into(),
            stable: stable.into(),
            clear_screen: false,
        }
    }

    #[must_use]
    pub fn with_clear_screen(mut self, clear: bool) -> Self {
        self.clear_screen = clear;
        self
    }

    pub const fn writer(&self) -> &W {
        &self.out
    }

    fn header_label(&self, column: SortColumn) -> String {
        match column {
            SortColumn::SequenceNumber => "Sr. No".to_string(),
            SortColumn::PairSymbol => "Pair".to_string(),
            SortColumn::LocalBid => format!("{} Bid", self.local),
            SortColumn::LocalAsk => format!("{} Ask", self.local),
            SortColumn::LocalVolume => "Volume".to_string(),
            SortColumn::StableBid => format!("{} Bid", self.stable),
            SortColumn::StableAsk => format!("{} Ask", self.stable),
            SortColumn::LastUpdated => "Last Updated".to_string(),
            SortColumn::BuyRatio => "Buy Range".to_string(),
            SortColumn::SellRatio => "Sell Range".to_string(),
        }
    }

    /// Build the full table text for a board.
    pub fn format_board(&self, board: &Board<'_>) -> String {
        let mut text = String::new();
        if self.clear_screen {
            text.push_str(CLEAR_SCREEN);
        }

        self.write_header(&mut text, board.sort());

        match board {
            Board::Loading { .. } => write_message(&mut text, LOADING_MESSAGE),
            Board::Failed { error, failed_at, .. } => {
                write_message(&mut text, ERROR_MESSAGE);
                let _ = writeln!(text, "Cause: {error}");
                let _ = writeln!(text, "Failed at: {}", failed_at.format("%Y-%m-%d %H:%M:%S"));
            }
            Board::Ready { rows, .. } if rows.is_empty() => write_message(&mut text, EMPTY_MESSAGE),
            Board::Ready {
                rows,
                refreshed_at,
                sort,
            } => {
                for entry in *rows {
                    write_row(&mut text, entry);
                }
                let _ = writeln!(text);
                let _ = writeln!(text, "Last updated: {}", refreshed_at.format("%Y-%m-%d %H:%M:%S"));
                let _ = writeln!(text, "Active pairs: {}", rows.len());
                if let Some(column) = sort.active_column {
                    let _ = writeln!(text, "Sorted by: {} {}", self.header_label(column), sort.direction.arrow());
                }
                let _ = writeln!(
                    text,
                    "Showing pairs available in both {local} and {stable} markets",
                    local = self.local,
                    stable = self.stable
                );
                let _ = writeln!(text, "Buy Range = {} Ask / {} Ask", self.local, self.stable);
                let _ = writeln!(text, "Sell Range = {} Bid / {} Bid", self.local, self.stable);
            }
        }
        text
    }

    fn write_header(&self, text: &mut String, sort: SortState) {
        let mut width_total = 0;
        for (column, width) in COLUMNS {
            let mut label = self.header_label(column);
            if sort.active_column == Some(column) {
                label.push(' ');
                label.push_str(sort.direction.arrow());
            }
            let _ = write!(text, "{label:>width$} ");
            width_total += width + 1;
        }
        let _ = writeln!(text);
        let _ = writeln!(text, "{}", "-".repeat(width_total));
    }
}

fn write_row(text: &mut String, entry: &ReconciledEntry) {
    let [seq, pair, bid, ask, volume, buy, sell] = COLUMNS.map(|(_, width)| width);
    let _ = writeln!(
        text,
        "{:>seq$} {:>pair$} {:>bid$.4} {:>ask$.4} {:>volume$.4} {:>buy$} {:>sell$} ",
        entry.sequence_number,
        entry.pair_symbol,
        entry.local_bid,
        entry.local_ask,
        entry.local_volume,
        entry.buy_ratio.to_string(),
        entry.sell_ratio.to_string(),
    );
}

fn write_message(text: &mut String, message: &str) {
    let _ = writeln!(text, "{message}");
}

impl<W: Write + Send> Presenter for TableRenderer<W> {
    fn render(&mut self, board: &Board<'_>) {
        let text = self.format_board(board);
        if let Err(e) = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush())
        {
            warn!(error = %e, "Failed to write table");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Local;

    use super::*;
    use crate::domain::entry::Ratio;
    use crate::domain::sort::SortDirection;
    use crate::ports::ticker_source::SourceError;

    fn renderer() -> TableRenderer<Vec<u8>> {
        TableRenderer::new(Vec::new(), "INR", "USDT")
    }

    fn btc() -> ReconciledEntry {
        ReconciledEntry {
            sequence_number: 1,
            pair_symbol: "BTCINR".to_string(),
            local_bid: 4_150_000.0,
            local_ask: 4_151_000.0,
            local_volume: 1.5,
            stable_bid: 50_000.0,
            stable_ask: 50_010.0,
            last_updated: "12:00:00".to_string(),
            buy_ratio: Ratio::Defined(83.0),
            sell_ratio: Ratio::Undefined,
        }
    }

    #[test]
    fn test_ready_board_renders_rows_and_footer() {
        let entry = btc();
        let rows = [&entry];
        let sort = SortState {
            active_column: Some(SortColumn::BuyRatio),
            direction: SortDirection::Descending,
        };
        let board = Board::Ready {
            rows: &rows,
            refreshed_at: Local::now(),
            sort,
        };
        let text = renderer().format_board(&board);

        assert!(text.contains("INR Bid"));
        assert!(text.contains("Buy Range ↓"));
        assert!(text.contains("4150000.0000"));
        assert!(text.contains("1.5000"));
        assert!(text.contains("83.00"));
        assert!(text.contains("—"));
        assert!(text.contains("Active pairs: 1"));
        assert!(text.contains("Buy Range = INR Ask / USDT Ask"));
        assert!(!text.contains("NaN"));
        assert!(!text.contains("inf"));
    }

    #[test]
    fn test_empty_and_error_states_are_distinct() {
        let empty = Board::Ready {
            rows: &[],
            refreshed_at: Local::now(),
            sort: SortState::default(),
        };
        let text = renderer().format_board(&empty);
        assert!(text.contains(EMPTY_MESSAGE));
        assert!(!text.contains(ERROR_MESSAGE));

        let error = SourceError::Status(502);
        let failed = Board::Failed {
            error: &error,
            failed_at: Local::now(),
            sort: SortState::default(),
        };
        let text = renderer().format_board(&failed);
        assert!(text.contains(ERROR_MESSAGE));
        assert!(text.contains("HTTP 502"));
        assert!(!text.contains(EMPTY_MESSAGE));
    }

    #[test]
    fn test_render_writes_to_writer() {
        let mut table = renderer().with_clear_screen(true);
        table.render(&Board::Loading {
            sort: SortState::default(),
        });
        let written = String::from_utf8(table.writer().clone()).unwrap();
        assert!(written.starts_with(CLEAR_SCREEN));
        assert!(written.contains(LOADING_MESSAGE));
    }
}
