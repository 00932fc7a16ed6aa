//! Shared test harness: a full application router wired to a scripted
//! in-memory provider, mirroring the construction in `main.rs` so
//! integration tests exercise the same middleware stack production uses.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use vidra_api::config::ServerConfig;
use vidra_api::router::build_app_router;
use vidra_api::state::AppState;
use vidra_core::request::GenerationRequest;
use vidra_engine::{
    ArtifactResolver, Dispatcher, Reconciler, RemixCoordinator, WebhookIngestor,
};
use vidra_provider::{
    ProviderAdapter, ProviderError, ProviderJobStatus, ProviderState, Submission,
};
use vidra_store::JobStore;

/// Webhook secret used by the test app.
pub const WEBHOOK_SECRET: &str = "test-webhook-secret";

// ---------------------------------------------------------------------------
// Scripted provider
// ---------------------------------------------------------------------------

pub enum SubmitScript {
    Rejected(&'static str),
    Unreachable,
}

/// In-memory [`ProviderAdapter`]. Submissions succeed with a fresh id
/// unless a script entry says otherwise; artifact fetches return
/// deterministic bytes and are counted.
#[derive(Default)]
pub struct MockProvider {
    pub submit_queue: Mutex<VecDeque<SubmitScript>>,
    pub submit_calls: AtomicUsize,
    pub remix_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub artifact_calls: AtomicUsize,
    next_id: AtomicUsize,
}

impl MockProvider {
    pub fn push_submit(&self, script: SubmitScript) {
        self.submit_queue.lock().unwrap().push_back(script);
    }

    fn run_submit_script(&self) -> Result<Submission, ProviderError> {
        match self.submit_queue.lock().unwrap().pop_front() {
            None => {
                let n = self.next_id.fetch_add(1, Ordering::SeqCst);
                Ok(Submission {
                    provider_job_id: format!("vid_{n}"),
                    state: ProviderState::Queued,
                })
            }
            Some(SubmitScript::Rejected(msg)) => Err(ProviderError::Api {
                status: 400,
                body: msg.to_string(),
            }),
            Some(SubmitScript::Unreachable) => Err(ProviderError::Api {
                status: 503,
                body: "service unavailable".to_string(),
            }),
        }
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn submit(&self, _request: &GenerationRequest) -> Result<Submission, ProviderError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.run_submit_script()
    }

    async fn remix(
        &self,
        _provider_job_id: &str,
        _prompt: &str,
    ) -> Result<Submission, ProviderError> {
        self.remix_calls.fetch_add(1, Ordering::SeqCst);
        self.run_submit_script()
    }

    async fn fetch_status(
        &self,
        _provider_job_id: &str,
    ) -> Result<ProviderJobStatus, ProviderError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProviderJobStatus {
            state: ProviderState::Queued,
            progress: 0,
            error: None,
        })
    }

    async fn fetch_artifact(
        &self,
        _provider_job_id: &str,
        variant: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        self.artifact_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("bytes:{variant}").into_bytes())
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// The application under test plus handles for scripting and inspection.
pub struct TestApp {
    pub app: Router,
    pub provider: Arc<MockProvider>,
    pub store: Arc<JobStore>,
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        provider_api_url: "http://localhost:0".to_string(),
        provider_api_key: "test-key".to_string(),
        webhook_secret: WEBHOOK_SECRET.to_string(),
        poll_interval_secs: 2,
        max_job_age_secs: 3600,
        poll_failure_cap: 5,
    }
}

/// Build the full application router backed by a [`MockProvider`].
///
/// The status poller is not spawned: integration tests drive
/// reconciliation through the webhook endpoint so assertions stay
/// deterministic.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(JobStore::new());
    let provider = Arc::new(MockProvider::default());
    let adapter: Arc<dyn ProviderAdapter> = Arc::clone(&provider) as Arc<dyn ProviderAdapter>;

    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&store), Arc::clone(&adapter)));
    let reconciler = Arc::new(Reconciler::new(Arc::clone(&store)));
    let webhook = Arc::new(WebhookIngestor::new(config.webhook_secret.clone()));
    let remix = Arc::new(RemixCoordinator::new(
        Arc::clone(&store),
        Arc::clone(&dispatcher),
    ));
    let artifacts = Arc::new(ArtifactResolver::new(
        Arc::clone(&store),
        Arc::clone(&adapter),
    ));

    let state = AppState {
        store: Arc::clone(&store),
        config: Arc::new(config.clone()),
        dispatcher,
        reconciler,
        webhook,
        remix,
        artifacts,
    };

    TestApp {
        app: build_app_router(state, &config),
        provider,
        store,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Send a request through the router and return the raw response.
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone()
        .oneshot(request)
        .await
        .expect("router should produce a response")
}

/// Send a JSON POST and return the status code and parsed body.
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = send(app, request).await;
    split(response).await
}

/// Send a GET and return the status code and parsed body.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = send(app, request).await;
    split(response).await
}

/// Split a response into its status code and parsed JSON body.
pub async fn split(response: Response<Body>) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

/// Submit a job through the API and return its id and provider id.
pub async fn submit_job(test: &TestApp) -> (String, String) {
    let (status, body) = post_json(
        &test.app,
        "/api/v1/videos",
        serde_json::json!({ "prompt": "a hummingbird in slow motion" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let job_id = body["data"]["job_id"].as_str().unwrap().to_string();

    let record = test
        .store
        .get(job_id.parse().unwrap())
        .await
        .expect("submitted job exists");
    let provider_job_id = record.provider_job_id.expect("submitted job has provider id");

    (job_id, provider_job_id)
}

/// Build a signed webhook request body + signature header value.
pub fn signed_webhook(event: serde_json::Value) -> (Vec<u8>, String) {
    let body = event.to_string().into_bytes();
    let signature = vidra_core::webhook::compute_signature(WEBHOOK_SECRET, &body);
    (body, signature)
}

/// POST a signed webhook event and return status + body.
pub async fn post_webhook(
    app: &Router,
    event: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let (body, signature) = signed_webhook(event);
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/provider/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .header(vidra_engine::SIGNATURE_HEADER, signature)
        .body(Body::from(body))
        .unwrap();
    let response = send(app, request).await;
    split(response).await
}
