//! Handlers for artifact downloads.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use vidra_core::artifacts::ArtifactKind;
use vidra_core::types::JobId;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/v1/videos/{id}/content/{kind}
///
/// Stream the bytes of one artifact of a completed job, with the kind's
/// content type and a download filename. Fails with 409 `NOT_READY`
/// before completion and 400 `UNKNOWN_KIND` for unsupported kinds.
pub async fn download_artifact(
    State(state): State<AppState>,
    Path((job_id, kind)): Path<(JobId, String)>,
) -> AppResult<Response> {
    let kind = ArtifactKind::parse(&kind).ok_or_else(|| AppError::UnknownKind(kind.clone()))?;

    let bytes = state.artifacts.fetch(job_id, kind).await?;

    tracing::debug!(
        job_id = %job_id,
        kind = %kind,
        size_bytes = bytes.len(),
        "Serving artifact download",
    );

    let filename = format!("{job_id}_{kind}.{}", kind.file_extension());
    let headers = [
        (header::CONTENT_TYPE, kind.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];

    Ok((headers, bytes.as_ref().clone()).into_response())
}
