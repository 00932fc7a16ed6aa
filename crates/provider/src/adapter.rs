//! The provider adapter trait: the seam between the orchestration
//! engine and any concrete generation provider.

use async_trait::async_trait;
use vidra_core::request::GenerationRequest;

use crate::error::ProviderError;
use crate::status::{ProviderJobStatus, ProviderState};

/// Result of a successful submission (fresh or remix).
#[derive(Debug, Clone)]
pub struct Submission {
    /// Provider-assigned job identifier.
    pub provider_job_id: String,
    /// Initial state the provider reported at submission.
    pub state: ProviderState,
}

/// Capability boundary of a generation provider.
///
/// The engine only ever sees this trait; tests supply scripted
/// implementations and production wires up [`crate::VideoGenClient`].
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Submit a fresh generation request.
    async fn submit(&self, request: &GenerationRequest) -> Result<Submission, ProviderError>;

    /// Start a remix of an existing provider-side video.
    async fn remix(
        &self,
        provider_job_id: &str,
        prompt: &str,
    ) -> Result<Submission, ProviderError>;

    /// Fetch the current status of a provider-side job.
    async fn fetch_status(&self, provider_job_id: &str)
        -> Result<ProviderJobStatus, ProviderError>;

    /// Download one artifact variant of a completed job.
    ///
    /// `variant` is the fetch token stored on the job record (for this
    /// provider, the variant name itself).
    async fn fetch_artifact(
        &self,
        provider_job_id: &str,
        variant: &str,
    ) -> Result<Vec<u8>, ProviderError>;
}
