//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP client, HTTP servers, terminal output).
//!
//! Adapter categories:
//! - `api`: Exchange ticker REST client (`TickerSource`)
//! - `proxy`: CORS proxy and browser board API
//! - `render`: Terminal table and JSON board snapshots (`Presenter`)
//! - `metrics`: Prometheus metrics export and health checks

pub mod api;
pub mod metrics;
pub mod proxy;
pub mod render;
