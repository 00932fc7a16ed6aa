use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidra_api::config::ServerConfig;
use vidra_api::router::build_app_router;
use vidra_api::state::AppState;
use vidra_engine::poller::PollerConfig;
use vidra_engine::{
    ArtifactResolver, Dispatcher, Reconciler, RemixCoordinator, StatusPoller, WebhookIngestor,
};
use vidra_provider::{ProviderAdapter, VideoGenClient};
use vidra_store::JobStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidra_api=debug,vidra_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Store and provider ---
    let store = Arc::new(JobStore::new());
    let provider: Arc<dyn ProviderAdapter> = Arc::new(VideoGenClient::new(
        config.provider_api_url.clone(),
        config.provider_api_key.clone(),
    ));
    tracing::info!(provider_api_url = %config.provider_api_url, "Provider client created");

    // --- Orchestration engine ---
    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&store), Arc::clone(&provider)));
    let reconciler = Arc::new(Reconciler::new(Arc::clone(&store)));
    let webhook = Arc::new(WebhookIngestor::new(config.webhook_secret.clone()));
    let remix = Arc::new(RemixCoordinator::new(
        Arc::clone(&store),
        Arc::clone(&dispatcher),
    ));
    let artifacts = Arc::new(ArtifactResolver::new(
        Arc::clone(&store),
        Arc::clone(&provider),
    ));

    // --- Status poller ---
    let poller_config = PollerConfig {
        interval: Duration::from_secs(config.poll_interval_secs),
        max_job_age_secs: config.max_job_age_secs,
        failure_cap: config.poll_failure_cap,
    };
    let poller = StatusPoller::new(
        Arc::clone(&store),
        Arc::clone(&provider),
        Arc::clone(&reconciler),
        poller_config,
    );
    let poller_cancel = tokio_util::sync::CancellationToken::new();
    let poller_handle = tokio::spawn(poller.run(poller_cancel.clone()));
    tracing::info!("Status poller started");

    // --- App state ---
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
        dispatcher,
        reconciler,
        webhook,
        remix,
        artifacts,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    poller_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), poller_handle).await;
    tracing::info!("Status poller stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
