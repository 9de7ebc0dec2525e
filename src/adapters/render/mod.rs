//! Presentation Adapters
//!
//! Implementations of the `Presenter` port:
//! - `table`: fixed-width text table for the terminal
//! - `publisher`: JSON-ready snapshots over a watch channel

pub mod publisher;
pub mod table;

pub use publisher::{BoardPublisher, BoardSnapshot, BoardStatus};
pub use table::TableRenderer;
