//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `TickerSource`: One-shot ticker snapshot per refresh cycle
//! - `Presenter`: Rendering of the ordered board

pub mod presenter;
pub mod ticker_source;
