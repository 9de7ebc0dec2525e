//! Refresh Scheduler - Fixed-Cadence Fetch, Reconcile, Commit Loop
//!
//! Owns the application state and drives reconciliation cycles:
//! 1. A fixed-interval timer (and on-demand `Refresh` commands) start a cycle
//! 2. The fetch runs as its own task; its handle is the in-flight marker
//! 3. Triggers arriving while a fetch is in flight are skipped
//! 4. On completion the batch is reconciled and committed on this task
//! 5. Every commit and every sort selection re-renders all presenters
//!
//! Sort commands are served while a fetch is outstanding, against the
//! committed dataset. A failed cycle never stops the loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Local;
use tokio::sync::{broadcast, mpsc};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::adapters::metrics::{HealthState, MetricsRegistry};
use crate::domain::reconciler::MarketReconciler;
use crate::domain::sort::SortColumn;
use crate::domain::ticker::RawTicker;
use crate::ports::presenter::Presenter;
use crate::ports::ticker_source::{SourceError, TickerSource};

use super::app_state::AppState;

type FetchResult = Result<Vec<RawTicker>, SourceError>;

/// Requests delivered to the scheduler from outside its task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
  /// Start a cycle now (skipped if one is in flight).
  Refresh,
  /// Apply a column-header selection and re-render.
  SelectColumn(SortColumn),
}

/// Result of one completed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
  /// Dataset replaced with `pairs` entries (possibly zero).
  Committed { pairs: usize },
  /// Cycle abandoned; the board now shows the error.
  Failed(SourceError),
}

/// Drives fetch → reconcile → commit → render cycles.
pub struct RefreshScheduler<S: TickerSource> {
  /// Ticker snapshot provider.
  source: Arc<S>,
  /// Pairing and ratio rules.
  reconciler: MarketReconciler,
  /// Committed dataset and sort state.
  state: AppState,
  /// Board renderers.
  presenters: Vec<Box<dyn Presenter>>,
  /// Timer period.
  interval: Duration,
  /// Outstanding fetch, if any. `Some` means a cycle is in flight.
  in_flight: Option<JoinHandle<FetchResult>>,
  /// When the in-flight cycle started.
  cycle_started: Option<Instant>,
  metrics: Option<Arc<MetricsRegistry>>,
  health: Option<Arc<HealthState>>,
}

impl<S: TickerSource> RefreshScheduler<S> {
  /// Create a scheduler with no presenters attached.
  pub fn new(source: Arc<S>, reconciler: MarketReconciler, interval: Duration) -> Self {
    Self {
      source,
      reconciler,
      state: AppState::new(),
      presenters: Vec::new(),
      interval,
      in_flight: None,
      cycle_started: None,
      metrics: None,
      health: None,
    }
  }

  #[must_use]
  pub fn with_presenter(mut self, presenter: Box<dyn Presenter>) -> Self {
    self.presenters.push(presenter);
    self
  }

  #[must_use]
  pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
    self.metrics = Some(metrics);
    self
  }

  #[must_use]
  pub fn with_health(mut self, health: Arc<HealthState>) -> Self {
    self.health = Some(health);
    self
  }

  pub const fn state(&self) -> &AppState {
    &self.state
  }

  pub const fn is_cycle_in_flight(&self) -> bool {
    self.in_flight.is_some()
  }

  /// Start a cycle unless one is already in flight.
  ///
  /// Returns `false` when the trigger was skipped. Must be called from
  /// within a tokio runtime.
  pub fn trigger(&mut self) -> bool {
    if self.in_flight.is_some() {
      debug!("Cycle still in flight, skipping trigger");
      if let Some(metrics) = &self.metrics {
        metrics.cycles_skipped.inc();
      }
      return false;
    }

    let source = Arc::clone(&self.source);
    self.cycle_started = Some(Instant::now());
    self.in_flight = Some(tokio::spawn(async move { source.fetch_tickers().await }));
    true
  }

  /// Wait for the in-flight cycle, then reconcile and commit it.
  ///
  /// Returns `None` when nothing was in flight.
  pub async fn await_cycle(&mut self) -> Option<CycleOutcome> {
    if self.in_flight.is_none() {
      return None;
    }
    let joined = wait_in_flight(&mut self.in_flight).await;
    self.in_flight = None;
    Some(self.complete_cycle(joined))
  }

  /// Trigger a cycle (or join the outstanding one) and wait for it.
  pub async fn run_cycle(&mut self) -> Option<CycleOutcome> {
    self.trigger();
    self.await_cycle().await
  }

  /// Apply a sort selection against the committed dataset and re-render.
  pub fn select_column(&mut self, column: SortColumn) {
    let sort = self.state.select_column(column);
    debug!(column = %column, direction = ?sort.direction, "Sort column selected");
    self.render();
  }

  /// Render the current state to every presenter.
  pub fn render(&mut self) {
    self.state.render_to(&mut self.presenters);
  }

  fn handle_command(&mut self, command: SchedulerCommand) {
    match command {
      SchedulerCommand::Refresh => {
        if !self.trigger() {
          info!("Manual refresh ignored, cycle already in flight");
        }
      }
      SchedulerCommand::SelectColumn(column) => self.select_column(column),
    }
  }

  fn complete_cycle(&mut self, joined: Result<FetchResult, JoinError>) -> CycleOutcome {
    let elapsed = self.cycle_started.take().map(|t| t.elapsed());
    let fetched = joined
      .unwrap_or_else(|e| Err(SourceError::Fetch(format!("fetch task did not complete: {e}"))));

    let outcome = match fetched {
      Ok(tickers) => {
        let reconciliation = self.reconciler.reconcile(&tickers);
        let pairs = reconciliation.entries.len();
        info!(
          pairs,
          records = reconciliation.stats.records,
          unmatched = reconciliation.stats.unmatched,
          rejected = reconciliation.stats.rejected,
          elapsed = ?elapsed,
          "Cycle committed"
        );
        self.state.commit(reconciliation.entries, Local::now());
        CycleOutcome::Committed { pairs }
      }
      Err(e) => {
        warn!(error = %e, kind = e.outcome_label(), "Cycle failed, showing error state");
        self.state.fail(e.clone(), Local::now());
        CycleOutcome::Failed(e)
      }
    };

    self.record(&outcome, elapsed);
    self.render();
    outcome
  }

  #[allow(clippy::cast_possible_wrap)]
  fn record(&self, outcome: &CycleOutcome, elapsed: Option<Duration>) {
    if let Some(health) = &self.health {
      health.record_cycle(matches!(outcome, CycleOutcome::Committed { .. }));
    }
    let Some(metrics) = &self.metrics else {
      return;
    };
    let (label, pairs) = match outcome {
      CycleOutcome::Committed { pairs } => ("success", *pairs),
      CycleOutcome::Failed(e) => (e.outcome_label(), 0),
    };
    metrics.cycles_total.with_label_values(&[label]).inc();
    metrics.active_pairs.set(pairs as i64);
    if let Some(elapsed) = elapsed {
      metrics.cycle_duration_seconds.observe(elapsed.as_secs_f64());
    }
  }

  /// Run the scheduler loop until shutdown.
  ///
  /// The first tick fires immediately, so a cycle starts at launch.
  #[instrument(skip_all)]
  pub async fn run(
    mut self,
    mut commands: mpsc::Receiver<SchedulerCommand>,
    mut shutdown_rx: broadcast::Receiver<()>,
  ) -> Result<()> {
    let mut ticker = tokio::time::interval(self.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
      source = %self.source.describe(),
      interval_s = self.interval.as_secs(),
      "Refresh scheduler started"
    );
    self.render();

    loop {
      tokio::select! {
        biased;
        _ = shutdown_rx.recv() => {
          info!("Refresh scheduler shutting down");
          break;
        }
        joined = wait_in_flight(&mut self.in_flight), if self.in_flight.is_some() => {
          self.in_flight = None;
          self.complete_cycle(joined);
        }
        Some(command) = commands.recv() => self.handle_command(command),
        _ = ticker.tick() => {
          self.trigger();
        }
      }
    }

    if let Some(handle) = self.in_flight.take() {
      handle.abort();
    }
    Ok(())
  }
}

/// Resolve the outstanding fetch; pends forever when there is none.
async fn wait_in_flight(
  in_flight: &mut Option<JoinHandle<FetchResult>>,
) -> Result<FetchResult, JoinError> {
  match in_flight {
    Some(handle) => handle.await,
    None => std::future::pending().await,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use async_trait::async_trait;

  struct StaticSource(FetchResult);

  #[async_trait]
  impl TickerSource for StaticSource {
    async fn fetch_tickers(&self) -> FetchResult {
      self.0.clone()
    }

    fn describe(&self) -> String {
      "static".to_string()
    }
  }

  fn scheduler(result: FetchResult) -> RefreshScheduler<StaticSource> {
    RefreshScheduler::new(
      Arc::new(StaticSource(result)),
      MarketReconciler::default(),
      Duration::from_secs(10),
    )
  }

  #[tokio::test]
  async fn test_await_without_cycle_is_none() {
    let mut s = scheduler(Ok(Vec::new()));
    assert!(s.await_cycle().await.is_none());
  }

  #[tokio::test]
  async fn test_successful_cycle_commits_and_updates_metrics() {
    let metrics = Arc::new(MetricsRegistry::new().unwrap());
    let health = Arc::new(HealthState::new());
    let mut s = scheduler(Ok(vec![
      RawTicker::new("BTCINR", 4_150_000.0, 4_151_000.0),
      RawTicker::new("BTCUSDT", 50_000.0, 50_010.0),
    ]))
    .with_metrics(Arc::clone(&metrics))
    .with_health(Arc::clone(&health));

    assert_eq!(s.run_cycle().await, Some(CycleOutcome::Committed { pairs: 1 }));
    assert!(!s.is_cycle_in_flight());
    assert_eq!(s.state().entries().len(), 1);
    assert_eq!(metrics.active_pairs.get(), 1);
    assert_eq!(metrics.cycles_total.with_label_values(&["success"]).get(), 1);
    assert!(health.is_ready());
  }

  #[tokio::test]
  async fn test_failed_cycle_records_parse_error() {
    let metrics = Arc::new(MetricsRegistry::new().unwrap());
    let mut s = scheduler(Err(SourceError::Parse("not an array".into())))
      .with_metrics(Arc::clone(&metrics));

    let outcome = s.run_cycle().await;
    assert!(matches!(outcome, Some(CycleOutcome::Failed(SourceError::Parse(_)))));
    assert_eq!(metrics.cycles_total.with_label_values(&["parse_error"]).get(), 1);
  }
}
