//! Prometheus Metrics Registry - Refresh and Proxy Observability
//!
//! Registers and exposes Prometheus metrics for Grafana dashboards.
//! Covers refresh cycle outcomes and latency, the active pair count,
//! and proxy traffic per exchange.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::config::MetricsConfig;

/// Centralized Prometheus metrics for the spread ticker.
///
/// All metrics follow the naming convention `spread_ticker_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Completed refresh cycles by outcome (success, fetch_error, parse_error).
    pub cycles_total: IntCounterVec,
    /// Ticks or refresh requests dropped because a cycle was in flight.
    pub cycles_skipped: IntCounter,
    /// Fetch-to-commit latency per cycle (seconds).
    pub cycle_duration_seconds: Histogram,
    /// Pairs in the committed dataset (0 after a failure).
    pub active_pairs: IntGauge,
    /// Proxy requests by exchange and response status.
    pub proxy_requests: IntCounterVec,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let cycles_total = IntCounterVec::new(
            Opts::new("spread_ticker_cycles_total", "Refresh cycles by outcome"),
            &["outcome"],
        )?;

        let cycles_skipped = IntCounter::new(
            "spread_ticker_cycles_skipped_total",
            "Refresh triggers skipped because a cycle was still in flight",
        )?;

        let cycle_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "spread_ticker_cycle_duration_seconds",
                "Refresh cycle latency from fetch start to commit",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;

        let active_pairs = IntGauge::new(
            "spread_ticker_active_pairs",
            "Pairs in the committed dataset",
        )?;

        let proxy_requests = IntCounterVec::new(
            Opts::new(
                "spread_ticker_proxy_requests_total",
                "Proxy requests by exchange and response status",
            ),
            &["exchange", "status"],
        )?;

        registry.register(Box::new(cycles_total.clone()))?;
        registry.register(Box::new(cycles_skipped.clone()))?;
        registry.register(Box::new(cycle_duration_seconds.clone()))?;
        registry.register(Box::new(active_pairs.clone()))?;
        registry.register(Box::new(proxy_requests.clone()))?;

        Ok(Self {
            registry,
            cycles_total,
            cycles_skipped,
            cycle_duration_seconds,
            active_pairs,
            proxy_requests,
        })
    }

    /// Registry shared by every component, or `None` when metrics are disabled.
    pub fn from_config(config: &MetricsConfig) -> anyhow::Result<Option<Arc<Self>>> {
        if !config.enabled {
            return Ok(None);
        }
        Ok(Some(Arc::new(Self::new()?)))
    }

    /// Encode all metrics in the Prometheus text format.
    pub fn gather_text(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&metrics_self);
                async move {
                    match metrics.gather_text() {
                        Ok(body) => (StatusCode::OK, body),
                        Err(e) => {
                            warn!(error = %e, "Failed to encode metrics");
                            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
                        }
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}
