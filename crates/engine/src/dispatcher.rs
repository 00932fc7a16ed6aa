//! Request dispatch: record creation and provider submission.
//!
//! The dispatcher owns the only transitions out of `pending`. Before a
//! provider id exists nothing else can address the job, so these two
//! edges (`pending -> submitted`, `pending -> failed`) are race-free and
//! committed with an expected sequence of zero.

use std::sync::Arc;

use vidra_core::classify::JobError;
use vidra_core::lifecycle::JobState;
use vidra_core::request::GenerationRequest;
use vidra_provider::ProviderAdapter;
use vidra_store::{JobRecord, JobStore};

use crate::error::EngineError;
use crate::event::{event_ordinal, SUBMISSION_SEQ};

/// Accepts generation requests, creates job records, and submits them to
/// the provider. Never waits for completion.
pub struct Dispatcher {
    store: Arc<JobStore>,
    provider: Arc<dyn ProviderAdapter>,
}

impl Dispatcher {
    pub fn new(store: Arc<JobStore>, provider: Arc<dyn ProviderAdapter>) -> Self {
        Self { store, provider }
    }

    /// Validate, create, and submit a generation request.
    ///
    /// Returns the job record in whatever state submission left it:
    /// `submitted` (with a provider id) on success, `failed` with a
    /// classified error when the provider refused or was unreachable.
    /// Requests carrying a remix parent are routed to the provider's
    /// remix operation, sourced from the parent's provider-side video.
    pub async fn dispatch(&self, request: GenerationRequest) -> Result<JobRecord, EngineError> {
        request.validate()?;

        let remix_source = match request.parent_job_id {
            Some(parent_id) => {
                let parent = self
                    .store
                    .get(parent_id)
                    .await
                    .ok_or(EngineError::JobNotFound(parent_id))?;
                if parent.state != JobState::Completed {
                    return Err(EngineError::ParentNotReady {
                        state: parent.state,
                    });
                }
                // Invariant: a completed job always has a provider id.
                let provider_id = parent.provider_job_id.clone().ok_or_else(|| {
                    EngineError::Internal(format!(
                        "Completed job {parent_id} has no provider id"
                    ))
                })?;
                Some(provider_id)
            }
            None => None,
        };

        let record = self.store.create(request.clone()).await;

        let result = match remix_source {
            Some(ref parent_provider_id) => {
                self.provider.remix(parent_provider_id, &request.prompt).await
            }
            None => self.provider.submit(&request).await,
        };

        match result {
            Ok(submission) => {
                tracing::info!(
                    job_id = %record.job_id,
                    provider_job_id = %submission.provider_job_id,
                    remix = remix_source.is_some(),
                    "Job submitted to provider",
                );
                let updated = self
                    .store
                    .compare_and_swap(record.job_id, 0, |rec| {
                        rec.state = JobState::Submitted;
                        rec.provider_job_id = Some(submission.provider_job_id.clone());
                        rec.last_event_seq = SUBMISSION_SEQ;
                    })
                    .await?;
                Ok(updated)
            }
            Err(e) => {
                let error = if e.is_rejection() {
                    JobError::submission_rejected(e.message())
                } else {
                    JobError::provider_unreachable(e.message())
                };
                tracing::warn!(
                    job_id = %record.job_id,
                    kind = error.kind.as_str(),
                    error = %e,
                    "Provider submission failed",
                );
                let updated = self
                    .store
                    .compare_and_swap(record.job_id, 0, |rec| {
                        rec.state = JobState::Failed;
                        rec.error = Some(error.clone());
                        rec.last_event_seq = event_ordinal(JobState::Failed, 0);
                    })
                    .await?;
                Ok(updated)
            }
        }
    }
}
