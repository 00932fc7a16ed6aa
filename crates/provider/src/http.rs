//! REST client for the video generation provider's HTTP endpoints.
//!
//! Wraps submission, remix, status, and artifact download using
//! [`reqwest`]. Responses are normalized into the closed
//! [`ProviderState`] set before they leave this module.

use async_trait::async_trait;
use serde::Deserialize;
use vidra_core::request::GenerationRequest;

use crate::adapter::{ProviderAdapter, Submission};
use crate::error::ProviderError;
use crate::status::{ProviderJobStatus, ProviderState};

/// HTTP client for the generation provider.
pub struct VideoGenClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Response body shared by the submit, remix, and status endpoints.
#[derive(Debug, Deserialize)]
struct VideoJobBody {
    /// Provider-assigned identifier for the job.
    id: String,
    /// Raw status string; normalized via [`ProviderState::parse`].
    status: String,
    #[serde(default)]
    progress: u8,
    error: Option<VideoJobError>,
}

/// Error object attached to a failed job's status body.
#[derive(Debug, Deserialize)]
struct VideoJobError {
    message: String,
}

impl VideoGenClient {
    /// Create a new client.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `https://api.provider.example/v1`.
    /// * `api_key`  - Bearer token sent with every request.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`] (useful
    /// for connection pooling).
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Normalize a raw status string, logging and defaulting to `Queued`
    /// for values this client does not recognize. An unknown status must
    /// never abort reconciliation; downstream ordinal fencing makes the
    /// conservative default a no-op.
    fn normalize_state(provider_job_id: &str, raw: &str) -> ProviderState {
        ProviderState::parse(raw).unwrap_or_else(|| {
            tracing::warn!(
                provider_job_id,
                raw_status = raw,
                "Unrecognized provider status, treating as queued",
            );
            ProviderState::Queued
        })
    }

    fn job_status(body: VideoJobBody) -> ProviderJobStatus {
        let state = Self::normalize_state(&body.id, &body.status);
        ProviderJobStatus {
            state,
            progress: body.progress.min(100),
            error: body.error.map(|e| e.message),
        }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ProviderError::Api`] with
    /// the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ProviderAdapter for VideoGenClient {
    /// Submit a generation request via `POST /videos`.
    async fn submit(&self, request: &GenerationRequest) -> Result<Submission, ProviderError> {
        let mut body = serde_json::json!({
            "prompt": request.prompt,
            "model": request.model,
            "size": request.size,
            "seconds": request.duration_secs.to_string(),
        });
        if let Some(ref url) = request.reference_image_url {
            body["input_reference"] = serde_json::Value::String(url.clone());
        }

        let response = self
            .client
            .post(format!("{}/videos", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let job: VideoJobBody = Self::parse_response(response).await?;
        let state = Self::normalize_state(&job.id, &job.status);

        tracing::info!(
            provider_job_id = %job.id,
            status = %job.status,
            "Generation submitted to provider",
        );

        Ok(Submission {
            provider_job_id: job.id,
            state,
        })
    }

    /// Start a remix via `POST /videos/{id}/remix`.
    async fn remix(
        &self,
        provider_job_id: &str,
        prompt: &str,
    ) -> Result<Submission, ProviderError> {
        let body = serde_json::json!({ "prompt": prompt });

        let response = self
            .client
            .post(format!("{}/videos/{provider_job_id}/remix", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let job: VideoJobBody = Self::parse_response(response).await?;
        let state = Self::normalize_state(&job.id, &job.status);

        tracing::info!(
            source_provider_job_id = provider_job_id,
            provider_job_id = %job.id,
            "Remix submitted to provider",
        );

        Ok(Submission {
            provider_job_id: job.id,
            state,
        })
    }

    /// Fetch job status via `GET /videos/{id}`.
    async fn fetch_status(
        &self,
        provider_job_id: &str,
    ) -> Result<ProviderJobStatus, ProviderError> {
        let response = self
            .client
            .get(format!("{}/videos/{provider_job_id}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let job: VideoJobBody = Self::parse_response(response).await?;
        Ok(Self::job_status(job))
    }

    /// Download an artifact via `GET /videos/{id}/content?variant={variant}`.
    async fn fetch_artifact(
        &self,
        provider_job_id: &str,
        variant: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .get(format!("{}/videos/{provider_job_id}/content", self.base_url))
            .query(&[("variant", variant)])
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
