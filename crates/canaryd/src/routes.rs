//! HTTP routes and handlers.
//!
//! - `GET  /health`
//! - `GET  /judges`
//! - `POST /judges/judge`
//! - `POST /judges/comparison`
//! - `GET  /judges/comparison/:execution_id`
//! - `GET  /concourse/:build_master/teams[/:team/pipelines[/:pipeline/{jobs,resources}]]`
//! - `POST /concourse/stage/start`
//!
//! Judge parameters travel as camelCase query parameters.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use canary_core::obs;
use canary_core::{
    CanaryExecutionResponse, CanaryJudgeResult, ComparisonRequest, ComparisonSummary,
    JudgeDescriptor, JudgeRequest,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/judges", get(list_judges))
        .route("/judges/judge", post(judge))
        .route("/judges/comparison", post(initiate_comparison))
        .route(
            "/judges/comparison/:execution_id",
            get(comparison_results),
        )
        .route("/concourse/stage/start", post(stage_start))
        .route("/concourse/:build_master/teams", get(teams))
        .route("/concourse/:build_master/teams/:team/pipelines", get(pipelines))
        .route(
            "/concourse/:build_master/teams/:team/pipelines/:pipeline/jobs",
            get(jobs),
        )
        .route(
            "/concourse/:build_master/teams/:team/pipelines/:pipeline/resources",
            get(resources),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

// ---------------------------------------------------------------------------
// Judges
// ---------------------------------------------------------------------------

async fn list_judges(State(state): State<AppState>) -> Json<Vec<JudgeDescriptor>> {
    Json(state.judges.list_judges())
}

async fn judge(
    State(state): State<AppState>,
    query: Result<Query<JudgeRequest>, QueryRejection>,
) -> ApiResult<CanaryJudgeResult> {
    let Query(request) = query?;
    let result = state
        .judges
        .judge(request)
        .await
        .inspect_err(|e| obs::emit_request_failed("judges.judge", e))?;
    Ok(Json(result))
}

async fn initiate_comparison(
    State(state): State<AppState>,
    query: Result<Query<ComparisonRequest>, QueryRejection>,
) -> ApiResult<CanaryExecutionResponse> {
    let Query(request) = query?;
    let response = state
        .judges
        .initiate_comparison(request)
        .await
        .inspect_err(|e| obs::emit_request_failed("judges.comparison", e))?;
    Ok(Json(response))
}

async fn comparison_results(
    State(state): State<AppState>,
    Path(execution_id): Path<String>,
) -> ApiResult<ComparisonSummary> {
    let summary = state
        .judges
        .comparison_results(&execution_id)
        .await
        .inspect_err(|e| obs::emit_request_failed("judges.comparison_results", e))?;
    Ok(Json(summary))
}

// ---------------------------------------------------------------------------
// Concourse
// ---------------------------------------------------------------------------

async fn teams(
    State(state): State<AppState>,
    Path(build_master): Path<String>,
) -> ApiResult<Vec<String>> {
    let names = state.bridge.igor()?.teams(&build_master).await?;
    Ok(Json(names))
}

async fn pipelines(
    State(state): State<AppState>,
    Path((build_master, team)): Path<(String, String)>,
) -> ApiResult<Vec<String>> {
    let names = state.bridge.igor()?.pipelines(&build_master, &team).await?;
    Ok(Json(names))
}

async fn jobs(
    State(state): State<AppState>,
    Path((build_master, team, pipeline)): Path<(String, String, String)>,
) -> ApiResult<Vec<String>> {
    let names = state
        .bridge
        .igor()?
        .jobs(&build_master, &team, &pipeline)
        .await?;
    Ok(Json(names))
}

async fn resources(
    State(state): State<AppState>,
    Path((build_master, team, pipeline)): Path<(String, String, String)>,
) -> ApiResult<Vec<String>> {
    let names = state
        .bridge
        .igor()?
        .resources(&build_master, &team, &pipeline)
        .await?;
    Ok(Json(names))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StageStartQuery {
    stage_id: String,
    job: String,
    build_number: i64,
}

async fn stage_start(
    State(state): State<AppState>,
    query: Result<Query<StageStartQuery>, QueryRejection>,
) -> Result<StatusCode, ApiError> {
    let Query(params) = query?;
    state
        .bridge
        .orca()?
        .concourse_stage_execution(&params.stage_id, &params.job, params.build_number)
        .await
        .inspect_err(|e| obs::emit_request_failed("concourse.stage_start", e))?;
    Ok(StatusCode::OK)
}
