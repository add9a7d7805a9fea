//! HTTP routes for the three insight tasks.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodRouter, get, post};
use axum::{Json, Router};
use insight_prompts::TaskKind;
use serde_json::{Value, json};
use tracing::{Instrument, info_span, warn};
use uuid::Uuid;

use crate::analyzer::Analyzer;
use crate::error::{ServiceError, ServiceResult};

/// Shared, read-only state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    analyzer: Arc<Analyzer>,
}

impl AppState {
    /// Wraps an analyzer for sharing across requests.
    #[must_use]
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
        }
    }
}

/// Builds the service router.
///
/// Task routes answer with and without their trailing slash.
#[must_use]
pub fn router(analyzer: Analyzer) -> Router {
    let routes = Router::new().route("/healthz", get(health));
    let routes = task_route(routes, TaskKind::FieldIdentification, post(analyze_event));
    let routes = task_route(routes, TaskKind::DatasetNaming, post(suggest_dataset_name));
    let routes = task_route(routes, TaskKind::RollupSuggestion, post(suggest_druid_rollups));
    routes.with_state(AppState::new(analyzer))
}

fn task_route(
    router: Router<AppState>,
    task: TaskKind,
    handler: MethodRouter<AppState>,
) -> Router<AppState> {
    let path = task.route();
    router
        .route(path, handler.clone())
        .route(path.trim_end_matches('/'), handler)
}

async fn analyze_event(State(state): State<AppState>, body: Bytes) -> Response {
    run_task(&state, TaskKind::FieldIdentification, &body).await
}

async fn suggest_dataset_name(State(state): State<AppState>, body: Bytes) -> Response {
    run_task(&state, TaskKind::DatasetNaming, &body).await
}

async fn suggest_druid_rollups(State(state): State<AppState>, body: Bytes) -> Response {
    run_task(&state, TaskKind::RollupSuggestion, &body).await
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "ok", "model": state.analyzer.model() }))
}

async fn run_task(state: &AppState, task: TaskKind, body: &[u8]) -> Response {
    let span = info_span!("task", request_id = %Uuid::new_v4(), %task);

    async move {
        match handle(state, task, body).await {
            Ok(value) => Json(value).into_response(),
            Err(err) => {
                warn!(?err, "request rejected");
                err.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

async fn handle(state: &AppState, task: TaskKind, body: &[u8]) -> ServiceResult<Value> {
    let payload: Value =
        serde_json::from_slice(body).map_err(|source| ServiceError::InvalidJson { source })?;
    let outcome = state.analyzer.analyze(task, &payload).await?;
    Ok(outcome.into_body(task))
}
