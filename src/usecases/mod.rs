//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces.
//!
//! Use cases:
//! - `AppState`: Committed dataset + sort state, single owner
//! - `RefreshScheduler`: Fixed-cadence fetch/reconcile/commit loop

pub mod app_state;
pub mod refresh_scheduler;

pub use app_state::{AppState, DatasetState};
pub use refresh_scheduler::{CycleOutcome, RefreshScheduler, SchedulerCommand};
