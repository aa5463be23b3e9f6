//! Hook server for the chat front-end
//!
//! Exposes the filter's inlet, outlet, and stop hooks over HTTP so the
//! host front-end can call them as a sidecar. The surface is deliberately
//! small: three POST hooks and a liveness probe.

use crate::config::Config;
use crate::error::Result;
use crate::filter::{Filter, StopOutcome};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Body of a stop request from the front-end
#[derive(Debug, Deserialize)]
struct StopRequest {
    session_id: String,
}

/// Build the hook router around a shared filter
pub fn router(filter: Arc<Filter>) -> Router {
    Router::new()
        .route("/inlet", post(inlet))
        .route("/outlet", post(outlet))
        .route("/stop", post(stop))
        .route("/health", get(health))
        .with_state(filter)
}

/// Run the hook server until the process is terminated
///
/// # Errors
///
/// Returns error if the filter cannot be built or the listen address
/// cannot be bound
pub async fn serve(config: &Config) -> Result<()> {
    let filter = Arc::new(Filter::new(&config.valves)?);
    let app = router(filter);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Hook server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn inlet(State(filter): State<Arc<Filter>>, Json(body): Json<Value>) -> Response {
    match filter.inlet(body) {
        Ok(body) => Json(body).into_response(),
        Err(e) => bad_request(&e.to_string()),
    }
}

async fn outlet(State(filter): State<Arc<Filter>>, Json(body): Json<Value>) -> Response {
    match filter.outlet(body) {
        Ok(body) => Json(body).into_response(),
        Err(e) => bad_request(&e.to_string()),
    }
}

async fn stop(State(filter): State<Arc<Filter>>, Json(request): Json<StopRequest>) -> Response {
    let outcome = filter.handle_stop(&request.session_id).await;
    let status = match outcome {
        StopOutcome::Stopped => StatusCode::OK,
        StopOutcome::UnknownSession => StatusCode::NOT_FOUND,
        StopOutcome::RelayFailed(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(outcome.to_response())).into_response()
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"status": "error", "message": message})),
    )
        .into_response()
}
