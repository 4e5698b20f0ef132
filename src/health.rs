//! HTTP health endpoint.

use axum::{Json, Router, response::IntoResponse, routing::get};

pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Spawn the health server on `port`.
pub fn spawn(port: u16) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(port, "Failed to bind health endpoint: {e}");
                return;
            }
        };
        tracing::info!(port, "Health endpoint started");
        axum::serve(listener, router()).await.ok();
    })
}
