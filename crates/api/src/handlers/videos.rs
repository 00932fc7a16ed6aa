//! Handlers for the `/videos` resource.
//!
//! Submission returns immediately with the job record in whatever state
//! the provider submission left it; completion is observed via the
//! status endpoint while webhooks and polling reconcile in the
//! background.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use vidra_core::request::{
    GenerationRequest, DEFAULT_DURATION_SECS, DEFAULT_MODEL, DEFAULT_SIZE,
};
use vidra_core::types::JobId;
use vidra_engine::EngineError;
use vidra_store::JobView;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

/// Body for `POST /api/v1/videos`.
#[derive(Debug, Deserialize)]
pub struct SubmitVideoRequest {
    pub prompt: String,
    pub model: Option<String>,
    pub size: Option<String>,
    pub duration_secs: Option<u32>,
    pub reference_image_url: Option<String>,
    pub parent_job_id: Option<JobId>,
}

impl SubmitVideoRequest {
    /// Normalize into a [`GenerationRequest`], applying defaults.
    fn into_request(self) -> GenerationRequest {
        GenerationRequest {
            prompt: self.prompt,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            size: self.size.unwrap_or_else(|| DEFAULT_SIZE.to_string()),
            duration_secs: self.duration_secs.unwrap_or(DEFAULT_DURATION_SECS),
            reference_image_url: self.reference_image_url,
            parent_job_id: self.parent_job_id,
        }
    }
}

/// Body for `POST /api/v1/videos/{id}/remix`.
#[derive(Debug, Deserialize)]
pub struct RemixVideoRequest {
    pub prompt: String,
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /api/v1/videos
///
/// Submit a new generation request. Returns 201 with the created job
/// projection; the job is `submitted` on success or already `failed`
/// with a classified error when the provider refused it.
pub async fn submit_video(
    State(state): State<AppState>,
    Json(input): Json<SubmitVideoRequest>,
) -> AppResult<impl IntoResponse> {
    let record = state.dispatcher.dispatch(input.into_request()).await?;

    tracing::info!(
        job_id = %record.job_id,
        state = %record.state,
        "Video generation requested",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: record.view(),
        }),
    ))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/v1/videos
///
/// List all tracked jobs, newest first.
pub async fn list_videos(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let views: Vec<JobView> = state
        .store
        .list()
        .await
        .iter()
        .map(|record| record.view())
        .collect();

    Ok(Json(DataResponse { data: views }))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/v1/videos/{id}
///
/// Current projection of one job: state, progress, classified error, and
/// artifact availability.
pub async fn get_video(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .store
        .get(job_id)
        .await
        .ok_or(EngineError::JobNotFound(job_id))?;

    Ok(Json(DataResponse {
        data: record.view(),
    }))
}

// ---------------------------------------------------------------------------
// Remix
// ---------------------------------------------------------------------------

/// POST /api/v1/videos/{id}/remix
///
/// Spawn a new job from a completed parent. Returns 201 with the child
/// projection, or 409 `PARENT_NOT_READY` while the parent is not
/// `completed`.
pub async fn remix_video(
    State(state): State<AppState>,
    Path(parent_job_id): Path<JobId>,
    Json(input): Json<RemixVideoRequest>,
) -> AppResult<impl IntoResponse> {
    let child = state.remix.remix(parent_job_id, input.prompt).await?;

    tracing::info!(
        parent_job_id = %parent_job_id,
        child_job_id = %child.job_id,
        "Remix job created",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse { data: child.view() }),
    ))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// DELETE /api/v1/videos/{id}
///
/// Drop a job record from the store. Returns 204 on success. Signals for
/// a deleted job are subsequently dropped by the reconciler as unknown.
pub async fn delete_video(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    state
        .store
        .remove(job_id)
        .await
        .ok_or(EngineError::JobNotFound(job_id))?;

    tracing::info!(job_id = %job_id, "Job record deleted");

    Ok(StatusCode::NO_CONTENT)
}
