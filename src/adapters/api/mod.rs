//! Exchange REST API Adapter
//!
//! Implements the `TickerSource` port over HTTP. The same client
//! talks to the exchange directly or through the local proxy.

pub mod client;

pub use client::{TickerClient, TickerClientConfig};
