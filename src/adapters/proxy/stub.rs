//! Local exchange stand-in for proxy tests.
//!
//! Serves a JSON ticker body, a 503 and an HTML page on an ephemeral
//! loopback port.

use axum::http::{StatusCode, header};
use axum::routing::get;
use axum::Router;

use crate::config::UpstreamConfig;

pub const TICKER_BODY: &str =
    r#"[{"market":"BTCINR","bid":"4150000","ask":"4151000"},{"market":"BTCUSDT","bid":50000,"ask":50010}]"#;

/// Start the stub and return its base URL.
pub async fn spawn_upstream() -> String {
    let app = Router::new()
        .route(
            "/ticker",
            get(|| async { ([(header::CONTENT_TYPE, "application/json")], TICKER_BODY) }),
        )
        .route(
            "/down",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        )
        .route("/html", get(|| async { "<html>blocked</html>" }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Upstreams `ok`, `down` and `html` pointing at the stub.
pub fn upstreams(base: &str) -> Vec<UpstreamConfig> {
    [("ok", "ticker"), ("down", "down"), ("html", "html")]
        .into_iter()
        .map(|(name, path)| UpstreamConfig {
            name: name.to_string(),
            url: format!("{base}/{path}"),
        })
        .collect()
}
