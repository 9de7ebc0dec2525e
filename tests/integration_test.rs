//! Integration Tests - Refresh Scheduler End-to-End
//!
//! Drives fetch → reconcile → commit → render cycles through the
//! scheduler with mocked ticker sources. Uses mockall for trait
//! mocking and tokio::test for async tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mockall::mock;
use tokio::sync::{Notify, broadcast, mpsc, watch};
use tokio_test::assert_ok;

use spread_ticker::adapters::metrics::MetricsRegistry;
use spread_ticker::adapters::render::{BoardPublisher, BoardSnapshot, BoardStatus};
use spread_ticker::domain::entry::Ratio;
use spread_ticker::domain::reconciler::MarketReconciler;
use spread_ticker::domain::sort::{SortColumn, SortDirection};
use spread_ticker::domain::ticker::RawTicker;
use spread_ticker::ports::ticker_source::{SourceError, TickerSource};
use spread_ticker::usecases::app_state::DatasetState;
use spread_ticker::usecases::refresh_scheduler::{
    CycleOutcome, RefreshScheduler, SchedulerCommand,
};

// ---- Mock Definitions ----

mock! {
    pub Source {}

    #[async_trait::async_trait]
    impl TickerSource for Source {
        async fn fetch_tickers(&self) -> Result<Vec<RawTicker>, SourceError>;
        fn describe(&self) -> String;
    }
}

/// Source whose fetch blocks until released, to hold a cycle in flight.
struct GatedSource {
    gate: Arc<Notify>,
    tickers: Vec<RawTicker>,
    fetches: Arc<AtomicUsize>,
}

impl GatedSource {
    fn new(gate: &Arc<Notify>, tickers: Vec<RawTicker>) -> Self {
        Self {
            gate: Arc::clone(gate),
            tickers,
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl TickerSource for GatedSource {
    async fn fetch_tickers(&self) -> Result<Vec<RawTicker>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(self.tickers.clone())
    }

    fn describe(&self) -> String {
        "gated".to_string()
    }
}

// ---- Helpers ----

fn btc_batch() -> Vec<RawTicker> {
    vec![
        RawTicker::new("BTCUSDT", 50_000.0, 50_010.0),
        RawTicker::new("BTCINR", 4_150_000.0, 4_151_000.0).with_timestamp(1_700_000_000),
    ]
}

fn mixed_batch() -> Vec<RawTicker> {
    vec![
        RawTicker::new("ETHINR", 170_000.0, 170_200.0),
        RawTicker::new("BTCINR", 4_150_000.0, 4_151_000.0),
        RawTicker::new("XRPINR", 52.0, 52.5),
        RawTicker::new("ETHUSDT", 2_000.0, 2_001.0),
        RawTicker::new("BTCUSDT", 50_000.0, 50_010.0),
        RawTicker::new("XRPUSDT", 0.6, 0.61),
        RawTicker::new("DOGEINR", 0.0, 0.0),
        RawTicker::new("DOGEUSDT", 0.08, 0.081),
        RawTicker::new("ETHBTC", 0.04, 0.041),
    ]
}

/// Mock that replays `results` in order, repeating the last one.
fn scripted_source(results: Vec<Result<Vec<RawTicker>, SourceError>>) -> MockSource {
    let calls = AtomicUsize::new(0);
    let mut source = MockSource::new();
    source.expect_fetch_tickers().returning(move || {
        let i = calls.fetch_add(1, Ordering::SeqCst).min(results.len() - 1);
        results[i].clone()
    });
    source.expect_describe().return_const("mock".to_string());
    source
}

fn scheduler_with_board(
    source: MockSource,
) -> (
    RefreshScheduler<MockSource>,
    watch::Receiver<Arc<BoardSnapshot>>,
) {
    let (publisher, board_rx) = BoardPublisher::new();
    let scheduler = RefreshScheduler::new(
        Arc::new(source),
        MarketReconciler::default(),
        Duration::from_secs(10),
    )
    .with_presenter(Box::new(publisher));
    (scheduler, board_rx)
}

fn pair_order(board: &BoardSnapshot) -> Vec<String> {
    board
        .rows
        .iter()
        .map(|r| r.entry.pair_symbol.clone())
        .collect()
}

// ---- Integration Tests ----

#[tokio::test]
async fn test_btc_scenario_produces_single_entry() {
    let (mut scheduler, board_rx) = scheduler_with_board(scripted_source(vec![Ok(btc_batch())]));

    let outcome = scheduler.run_cycle().await;
    assert_eq!(outcome, Some(CycleOutcome::Committed { pairs: 1 }));

    let entries = scheduler.state().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].pair_symbol, "BTCINR");
    assert_eq!(entries[0].sequence_number, 1);
    assert_eq!(entries[0].buy_ratio, Ratio::Defined(83.0));
    assert_eq!(entries[0].sell_ratio, Ratio::Defined(83.0));

    let board = board_rx.borrow().clone();
    assert_eq!(board.status, BoardStatus::Ready);
    assert_eq!(board.active_pairs, 1);
    assert_eq!(board.rows[0].buy_ratio_display, "83.00");
}

#[tokio::test]
async fn test_unmatched_local_market_is_empty_not_error() {
    let source = scripted_source(vec![Ok(vec![RawTicker::new("BTCINR", 1.0, 1.0)])]);
    let (mut scheduler, board_rx) = scheduler_with_board(source);

    assert_eq!(
        scheduler.run_cycle().await,
        Some(CycleOutcome::Committed { pairs: 0 })
    );
    assert!(matches!(
        scheduler.state().dataset(),
        DatasetState::Ready { entries, .. } if entries.is_empty()
    ));
    assert_eq!(board_rx.borrow().status, BoardStatus::Empty);
    assert!(board_rx.borrow().error.is_none());
}

#[tokio::test]
async fn test_fetch_failure_discards_previous_dataset() {
    let source = scripted_source(vec![
        Ok(mixed_batch()),
        Err(SourceError::Fetch("connection reset".into())),
    ]);
    let (mut scheduler, board_rx) = scheduler_with_board(source);

    assert_eq!(
        scheduler.run_cycle().await,
        Some(CycleOutcome::Committed { pairs: 3 })
    );
    assert_eq!(board_rx.borrow().active_pairs, 3);

    let outcome = scheduler.run_cycle().await;
    assert!(matches!(outcome, Some(CycleOutcome::Failed(SourceError::Fetch(_)))));
    assert!(scheduler.state().entries().is_empty());

    let board = board_rx.borrow().clone();
    assert_eq!(board.status, BoardStatus::Error);
    assert!(board.rows.is_empty());
    assert!(board.error.as_deref().unwrap_or_default().contains("connection reset"));
}

#[tokio::test]
async fn test_sort_state_survives_refresh() {
    let source = scripted_source(vec![Ok(mixed_batch())]);
    let (mut scheduler, board_rx) = scheduler_with_board(source);
    scheduler.run_cycle().await;

    assert_eq!(pair_order(&board_rx.borrow()), ["ETHINR", "BTCINR", "XRPINR"]);

    scheduler.select_column(SortColumn::LocalBid);
    scheduler.select_column(SortColumn::LocalBid);
    assert_eq!(pair_order(&board_rx.borrow()), ["BTCINR", "ETHINR", "XRPINR"]);

    scheduler.run_cycle().await;
    let board = board_rx.borrow().clone();
    assert_eq!(board.sort.active_column, Some(SortColumn::LocalBid));
    assert_eq!(board.sort.direction, SortDirection::Descending);
    assert_eq!(pair_order(&board), ["BTCINR", "ETHINR", "XRPINR"]);
    let seqs: Vec<u32> = board.rows.iter().map(|r| r.entry.sequence_number).collect();
    assert_eq!(seqs, [2, 1, 3]);
}

#[tokio::test]
async fn test_overlapping_trigger_is_skipped_while_in_flight() {
    let gate = Arc::new(Notify::new());
    let source = GatedSource::new(&gate, btc_batch());
    let (publisher, board_rx) = BoardPublisher::new();
    let mut scheduler = RefreshScheduler::new(
        Arc::new(source),
        MarketReconciler::default(),
        Duration::from_secs(10),
    )
    .with_presenter(Box::new(publisher));

    assert!(scheduler.trigger());
    assert!(scheduler.is_cycle_in_flight());
    assert!(!scheduler.trigger());

    // Sorting still works against the (empty) committed state.
    scheduler.select_column(SortColumn::PairSymbol);
    assert_eq!(board_rx.borrow().status, BoardStatus::Loading);
    assert_eq!(
        board_rx.borrow().sort.active_column,
        Some(SortColumn::PairSymbol)
    );

    gate.notify_one();
    let outcome = assert_ok!(
        tokio::time::timeout(Duration::from_secs(5), scheduler.await_cycle()).await
    );
    assert_eq!(outcome, Some(CycleOutcome::Committed { pairs: 1 }));
    assert!(!scheduler.is_cycle_in_flight());
    assert!(scheduler.trigger());
}

#[tokio::test]
async fn test_run_loop_serves_commands_and_recovers_from_failure() {
    let source = scripted_source(vec![
        Err(SourceError::Parse("expected array".into())),
        Ok(mixed_batch()),
    ]);
    let (scheduler, mut board_rx) = scheduler_with_board(source);
    let (command_tx, command_rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let handle = tokio::spawn(scheduler.run(command_rx, shutdown_rx));

    // First tick fires immediately and fails.
    assert_ok!(
        tokio::time::timeout(
            Duration::from_secs(5),
            board_rx.wait_for(|b| b.status == BoardStatus::Error)
        )
        .await
    );

    // Manual refresh recovers without waiting for the next tick.
    command_tx.send(SchedulerCommand::Refresh).await.unwrap();
    assert_ok!(
        tokio::time::timeout(
            Duration::from_secs(5),
            board_rx.wait_for(|b| b.status == BoardStatus::Ready)
        )
        .await
    );

    command_tx
        .send(SchedulerCommand::SelectColumn(SortColumn::PairSymbol))
        .await
        .unwrap();
    assert_ok!(
        tokio::time::timeout(
            Duration::from_secs(5),
            board_rx.wait_for(|b| b.sort.active_column == Some(SortColumn::PairSymbol))
        )
        .await
    );
    assert_eq!(pair_order(&board_rx.borrow()), ["BTCINR", "ETHINR", "XRPINR"]);

    shutdown_tx.send(()).unwrap();
    let joined = assert_ok!(tokio::time::timeout(Duration::from_secs(5), handle).await);
    assert!(joined.unwrap().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_timer_recovers_after_failed_cycle() {
    let source = scripted_source(vec![
        Err(SourceError::Fetch("connection reset".into())),
        Ok(mixed_batch()),
    ]);
    let metrics = Arc::new(MetricsRegistry::new().unwrap());
    let (publisher, mut board_rx) = BoardPublisher::new();
    let scheduler = RefreshScheduler::new(
        Arc::new(source),
        MarketReconciler::default(),
        Duration::from_secs(1),
    )
    .with_presenter(Box::new(publisher))
    .with_metrics(Arc::clone(&metrics));
    let (_command_tx, command_rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(scheduler.run(command_rx, shutdown_rx));

    assert_ok!(
        tokio::time::timeout(
            Duration::from_millis(500),
            board_rx.wait_for(|b| b.status == BoardStatus::Error)
        )
        .await
    );

    // No command is sent: only the next tick can start the recovery cycle.
    assert_ok!(
        tokio::time::timeout(
            Duration::from_secs(3),
            board_rx.wait_for(|b| b.status == BoardStatus::Ready)
        )
        .await
    );
    assert_eq!(board_rx.borrow().active_pairs, 3);
    assert_eq!(metrics.cycles_total.with_label_values(&["fetch_error"]).get(), 1);
    assert!(metrics.cycles_total.with_label_values(&["success"]).get() >= 1);

    shutdown_tx.send(()).unwrap();
    assert_ok!(tokio::time::timeout(Duration::from_secs(5), handle).await).unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_ticks_during_in_flight_fetch_are_skipped() {
    let gate = Arc::new(Notify::new());
    let source = GatedSource::new(&gate, btc_batch());
    let fetches = Arc::clone(&source.fetches);
    let metrics = Arc::new(MetricsRegistry::new().unwrap());
    let (publisher, mut board_rx) = BoardPublisher::new();
    let scheduler = RefreshScheduler::new(
        Arc::new(source),
        MarketReconciler::default(),
        Duration::from_secs(1),
    )
    .with_presenter(Box::new(publisher))
    .with_metrics(Arc::clone(&metrics));
    let (_command_tx, command_rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(scheduler.run(command_rx, shutdown_rx));

    // The startup fetch stays blocked while three more ticks elapse.
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert!(metrics.cycles_skipped.get() >= 1);
    assert_eq!(board_rx.borrow().status, BoardStatus::Loading);

    gate.notify_one();
    assert_ok!(
        tokio::time::timeout(
            Duration::from_millis(500),
            board_rx.wait_for(|b| b.status == BoardStatus::Ready)
        )
        .await
    );
    assert_eq!(metrics.cycles_total.with_label_values(&["success"]).get(), 1);

    shutdown_tx.send(()).unwrap();
    assert_ok!(tokio::time::timeout(Duration::from_secs(5), handle).await).unwrap().unwrap();
}
