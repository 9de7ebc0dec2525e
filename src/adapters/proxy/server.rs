//! Proxy Server - CORS Proxy and Browser Board API
//!
//! Routes:
//! - `GET  /`                    browser board page
//! - `GET  /api/:exchange`       verbatim upstream JSON (CORS-enabled)
//! - `GET  /board`               current board snapshot as JSON
//! - `POST /board/sort/:column`  column-header click
//! - `POST /board/refresh`       on-demand refresh

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::{broadcast, mpsc, watch};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use crate::adapters::metrics::MetricsRegistry;
use crate::adapters::render::BoardSnapshot;
use crate::domain::sort::SortColumn;
use crate::usecases::refresh_scheduler::SchedulerCommand;

use super::upstream::UpstreamRegistry;

/// Metric label for requests naming no configured exchange.
const UNKNOWN_EXCHANGE_LABEL: &str = "unknown";

/// Browser board: polls `/board`, posts header clicks to `/board/sort/:column`.
const BOARD_PAGE: &str = include_str!("board.html");

/// State shared by every proxy handler.
pub struct ProxyState {
    /// Forwardable exchanges.
    pub upstreams: UpstreamRegistry,
    /// Latest board published by the scheduler.
    pub board_rx: watch::Receiver<Arc<BoardSnapshot>>,
    /// Command channel into the scheduler task.
    pub commands: mpsc::Sender<SchedulerCommand>,
    pub metrics: Option<Arc<MetricsRegistry>>,
}

/// Build the proxy + board router.
pub fn router(state: Arc<ProxyState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/api/:exchange", get(proxy_exchange))
        .route("/board", get(board))
        .route("/board/sort/:column", post(select_column))
        .route("/board/refresh", post(refresh))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the proxy until shutdown.
#[instrument(skip(state, shutdown_rx))]
pub async fn serve(
    state: Arc<ProxyState>,
    bind_address: String,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let exchanges = state.upstreams.names().join(",");
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, exchanges = %exchanges, "Proxy server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await?;

    Ok(())
}

async fn proxy_exchange(
    State(state): State<Arc<ProxyState>>,
    Path(exchange): Path<String>,
) -> Response {
    let result = state.upstreams.forward(&exchange).await;
    let status = result
        .as_ref()
        .map_or_else(|e| e.status_code(), |_| StatusCode::OK);
    if let Some(metrics) = &state.metrics {
        let label = if state.upstreams.contains(&exchange) {
            exchange.as_str()
        } else {
            UNKNOWN_EXCHANGE_LABEL
        };
        metrics
            .proxy_requests
            .with_label_values(&[label, status.as_str()])
            .inc();
    }

    match result {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            warn!(exchange = %exchange, error = %e, "Proxy request failed");
            e.into_response()
        }
    }
}

async fn index() -> Html<&'static str> {
    Html(BOARD_PAGE)
}

async fn board(State(state): State<Arc<ProxyState>>) -> Json<BoardSnapshot> {
    let snapshot = state.board_rx.borrow().clone();
    Json(BoardSnapshot::clone(&snapshot))
}

async fn select_column(
    State(state): State<Arc<ProxyState>>,
    Path(column): Path<String>,
) -> Response {
    match column.parse::<SortColumn>() {
        Ok(column) => send_command(&state, SchedulerCommand::SelectColumn(column)).await,
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

async fn refresh(State(state): State<Arc<ProxyState>>) -> Response {
    send_command(&state, SchedulerCommand::Refresh).await
}

async fn send_command(state: &ProxyState, command: SchedulerCommand) -> Response {
    if state.commands.send(command).await.is_err() {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "scheduler is not running");
    }
    StatusCode::ACCEPTED.into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
