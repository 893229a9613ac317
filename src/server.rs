//! HTTP control surface.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::metrics::Metrics;
use crate::process::ProcessResolver;
use crate::registry::TrackerRegistry;
use crate::report::{StopReport, StopResponse};

const NOT_FOUND: &str = "Process not found";

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TrackerRegistry>,
    pub resolver: Arc<dyn ProcessResolver>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        registry: Arc<TrackerRegistry>,
        resolver: Arc<dyn ProcessResolver>,
        metrics: Metrics,
    ) -> Self {
        Self {
            registry,
            resolver,
            metrics,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/start/pgrep/", get(start_without_pattern).post(start_without_pattern))
        .route("/start/pgrep/*pattern", get(start_tracking).post(start_tracking))
        .route("/stop/pgrep", get(stop_all).post(stop_all))
        .route("/stop/pgrep/", get(stop_all).post(stop_all))
        .route("/stop/pgrep/*name", get(stop_tracking).post(stop_tracking))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Serves the control surface until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

pub async fn start_tracking(
    State(state): State<AppState>,
    Path(pattern): Path<String>,
) -> Result<Json<Value>, (StatusCode, &'static str)> {
    // scanning the process table blocks
    let resolver = Arc::clone(&state.resolver);
    let lookup = pattern.clone();
    let resolved = tokio::task::spawn_blocking(move || resolver.resolve(&lookup))
        .await
        .map_err(|e| {
            error!("process lookup task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Process lookup failed")
        })?;

    let handle = resolved.map_err(|e| {
        info!(pattern = %pattern, "not starting: {}", e);
        (StatusCode::NOT_FOUND, NOT_FOUND)
    })?;

    state.registry.add(pattern.clone(), handle);
    state.metrics.set_tracked(state.registry.len());
    Ok(Json(json!({ "message": format!("Started tracking {}", pattern) })))
}

async fn start_without_pattern() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, NOT_FOUND)
}

pub async fn stop_tracking(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<StopResponse> {
    let response = match state.registry.remove(&name) {
        Some(tracker) => {
            state.metrics.forget(&name);
            StopResponse::Stopped(tracker.into_report(&name))
        }
        None => StopResponse::inactive(&name),
    };
    state.metrics.set_tracked(state.registry.len());
    Json(response)
}

pub async fn stop_all(State(state): State<AppState>) -> Json<BTreeMap<String, StopReport>> {
    let reports = state
        .registry
        .remove_all()
        .into_iter()
        .map(|(name, tracker)| {
            state.metrics.forget(&name);
            let report = tracker.into_report(&name);
            (name, report)
        })
        .collect();
    state.metrics.set_tracked(state.registry.len());
    Json(reports)
}

pub async fn metrics_handler(
    State(state): State<AppState>,
) -> Result<String, (StatusCode, String)> {
    state
        .metrics
        .encode()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
