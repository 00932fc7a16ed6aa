//! Route tree construction.

pub mod health;
pub mod videos;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /videos                      list, submit
/// /videos/{id}                 get, delete
/// /videos/{id}/remix           remix (POST)
/// /videos/{id}/content/{kind}  artifact download
///
/// /provider/webhook            signed provider notifications (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/videos", videos::router())
        .route("/provider/webhook", post(handlers::webhook::provider_webhook))
}
