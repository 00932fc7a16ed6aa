use std::sync::Arc;

use vidra_engine::{ArtifactResolver, Dispatcher, Reconciler, RemixCoordinator, WebhookIngestor};
use vidra_store::JobStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// Cheaply cloneable; everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The job record store (read paths: listing, projections).
    pub store: Arc<JobStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Creates and submits jobs.
    pub dispatcher: Arc<Dispatcher>,
    /// The state-transition authority fed by webhooks and polling.
    pub reconciler: Arc<Reconciler>,
    /// Verifies and decodes inbound provider notifications.
    pub webhook: Arc<WebhookIngestor>,
    /// Spawns remix jobs from completed parents.
    pub remix: Arc<RemixCoordinator>,
    /// Fetches and caches artifact bytes for downloads.
    pub artifacts: Arc<ArtifactResolver>,
}
