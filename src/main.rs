//! Spread Ticker — Entry Point
//!
//! Polls the exchange ticker, reconciles the INR and USDT markets and
//! renders the spread board until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml (path from argv[1] or SPREAD_TICKER_CONFIG) + validate
//! 2. Init tracing (JSON or compact, to stderr)
//! 3. Create metrics registry + health state, spawn their servers
//! 4. Create TickerClient (implements TickerSource port)
//! 5. Create presenters: stdout table + board publisher
//! 6. Spawn proxy/board server on :3000 (/api/:exchange, /board)
//! 7. Spawn RefreshScheduler (interval timer + command channel)
//! 8. Wait for SIGINT → graceful shutdown (signal→not-ready→join)

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

use spread_ticker::adapters::api::{TickerClient, TickerClientConfig};
use spread_ticker::adapters::metrics::{HealthServer, HealthState, MetricsRegistry};
use spread_ticker::adapters::proxy::{self, ProxyState, UpstreamRegistry};
use spread_ticker::adapters::render::{BoardPublisher, TableRenderer};
use spread_ticker::config::{self, AppConfig, LogFormat};
use spread_ticker::domain::reconciler::MarketReconciler;
use spread_ticker::usecases::refresh_scheduler::{RefreshScheduler, SchedulerCommand};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration ───────────────────────────────
    let config = config::loader::load_from_env(std::env::args().nth(1))
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured logging ────────────────────
    init_tracing(&config);

    info!(
        name = %config.app.name,
        version = env!("CARGO_PKG_VERSION"),
        source = %config.source.url,
        local = %config.markets.local_suffix,
        stable = %config.markets.stable_suffix,
        "Starting spread ticker"
    );

    // ── 3. Shutdown channel, metrics, health ────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let metrics = MetricsRegistry::from_config(&config.metrics)
        .context("Failed to create metrics registry")?;
    let health = Arc::new(HealthState::new());
    let mut handles = Vec::new();

    if let Some(metrics) = &metrics {
        let metrics_ref = Arc::clone(metrics);
        let bind = config.metrics.bind_address.clone();
        let rx = shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move {
            if let Err(e) = metrics_ref.serve(bind, rx).await {
                error!(error = %e, "Metrics server failed");
            }
        }));

        let server = HealthServer::new(Arc::clone(&health), config.metrics.health_port);
        let rx = shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move {
            if let Err(e) = server.run(rx).await {
                error!(error = %e, "Health server failed");
            }
        }));
    }

    // ── 4. Ticker source ────────────────────────────────────
    let client = Arc::new(
        TickerClient::new(TickerClientConfig::from(&config.source))
            .context("Failed to create ticker client")?,
    );

    // ── 5. Presenters ───────────────────────────────────────
    let (publisher, board_rx) = BoardPublisher::new();
    let reconciler = MarketReconciler::new(
        config.markets.local_suffix.clone(),
        config.markets.stable_suffix.clone(),
    );
    let mut scheduler = RefreshScheduler::new(
        client,
        reconciler,
        Duration::from_secs(config.refresh.interval_seconds),
    )
    .with_presenter(Box::new(publisher))
    .with_health(Arc::clone(&health));

    if let Some(metrics) = &metrics {
        scheduler = scheduler.with_metrics(Arc::clone(metrics));
    }

    if config.app.render_table {
        let table = TableRenderer::new(
            std::io::stdout(),
            config.markets.local_suffix.clone(),
            config.markets.stable_suffix.clone(),
        )
        .with_clear_screen(true);
        scheduler = scheduler.with_presenter(Box::new(table));
    }

    // ── 6. Proxy + board server ─────────────────────────────
    let (command_tx, command_rx) = mpsc::channel::<SchedulerCommand>(32);

    if config.proxy.enabled {
        let state = Arc::new(ProxyState {
            upstreams: UpstreamRegistry::new(&config.proxy, config.source.user_agent.clone())
                .context("Failed to create proxy upstreams")?,
            board_rx,
            commands: command_tx.clone(),
            metrics: metrics.clone(),
        });
        let bind = config.proxy.bind_address.clone();
        let rx = shutdown_tx.subscribe();
        handles.push(tokio::spawn(async move {
            if let Err(e) = proxy::serve(state, bind, rx).await {
                error!(error = %e, "Proxy server failed");
            }
        }));
    }

    // ── 7. Refresh scheduler ────────────────────────────────
    let scheduler_shutdown = shutdown_tx.subscribe();
    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = scheduler.run(command_rx, scheduler_shutdown).await {
            error!(error = %e, "Refresh scheduler failed");
        }
    });

    info!("All tasks spawned — ticker is running");

    // ── 8. Wait for SIGINT ──────────────────────────────────
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for SIGINT, shutting down");
    } else {
        info!("SIGINT received, initiating graceful shutdown");
    }

    let _ = shutdown_tx.send(());
    health.mark_shutting_down();
    drop(command_tx);

    let _ = tokio::time::timeout(Duration::from_secs(5), scheduler_handle).await;
    for handle in handles {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!("Shutdown complete");
    Ok(())
}

/// Initialize tracing to stderr; `RUST_LOG` overrides the configured level.
fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.app.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.app.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}
