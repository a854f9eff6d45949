use crate::lifecycle::{JobView, SubmitOutcome};
use crate::server::{AppContext, AppError};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use vodbridge_common::JobId;

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/jobs", get(list_jobs).post(submit_job))
        .route("/jobs/{id}", get(get_job).delete(delete_job))
        .route("/jobs/{id}/retry", post(retry_job))
        .route("/queue-status", get(queue_status))
}

#[derive(Deserialize)]
struct ListJobsQuery {
    search: Option<String>,
}

async fn list_jobs(
    State(ctx): State<AppContext>,
    Query(params): Query<ListJobsQuery>,
) -> Result<Json<Vec<JobView>>, AppError> {
    let jobs = ctx.manager.list(params.search.as_deref())?;
    Ok(Json(jobs))
}

#[derive(Deserialize)]
struct SubmitJobRequest {
    #[serde(default)]
    video_url: String,
    #[serde(default)]
    title: String,
}

#[derive(Serialize)]
struct JobResponse {
    message: String,
    job: JobView,
    #[serde(skip_serializing_if = "Option::is_none")]
    queue_position: Option<i64>,
}

impl From<SubmitOutcome> for JobResponse {
    fn from(outcome: SubmitOutcome) -> Self {
        Self {
            message: outcome.message,
            job: JobView::from(outcome.job),
            queue_position: outcome.queue_position,
        }
    }
}

async fn submit_job(
    State(ctx): State<AppContext>,
    payload: Result<Json<SubmitJobRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let outcome = ctx.manager.submit(&request.video_url, &request.title).await?;
    Ok((StatusCode::CREATED, Json(JobResponse::from(outcome))))
}

async fn get_job(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<Json<JobView>, AppError> {
    let job = ctx.manager.get(JobId::from(id))?;
    Ok(Json(JobView::from(job)))
}

async fn retry_job(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<Json<JobResponse>, AppError> {
    let outcome = ctx.manager.retry(JobId::from(id)).await?;
    Ok(Json(JobResponse::from(outcome)))
}

async fn delete_job(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = ctx.manager.delete(JobId::from(id)).await?;
    Ok(Json(serde_json::json!({
        "message": outcome.message,
        "remote_cleanup_failed": outcome.remote_cleanup_failed,
    })))
}

async fn queue_status(State(ctx): State<AppContext>) -> Result<impl IntoResponse, AppError> {
    let status = ctx.manager.queue_status().await?;
    Ok(Json(status))
}
