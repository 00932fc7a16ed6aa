//! Route definitions for the `/videos` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{downloads, videos};
use crate::state::AppState;

/// Routes mounted at `/videos`.
///
/// ```text
/// GET    /                      -> list_videos
/// POST   /                      -> submit_video
/// GET    /{id}                  -> get_video
/// DELETE /{id}                  -> delete_video
/// POST   /{id}/remix            -> remix_video
/// GET    /{id}/content/{kind}   -> download_artifact
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(videos::list_videos).post(videos::submit_video))
        .route(
            "/{id}",
            get(videos::get_video).delete(videos::delete_video),
        )
        .route("/{id}/remix", post(videos::remix_video))
        .route("/{id}/content/{kind}", get(downloads::download_artifact))
}
