//! Remix coordination: deriving a new job from a completed parent.

use std::sync::Arc;

use vidra_core::lifecycle::JobState;
use vidra_core::request::GenerationRequest;
use vidra_core::types::JobId;
use vidra_store::{JobRecord, JobStore};

use crate::dispatcher::Dispatcher;
use crate::error::EngineError;

/// Creates remix jobs whose source material is a prior completed job's
/// output. Chains are acyclic by construction: a parent must already be
/// `completed` before a child referencing it can exist.
pub struct RemixCoordinator {
    store: Arc<JobStore>,
    dispatcher: Arc<Dispatcher>,
}

impl RemixCoordinator {
    pub fn new(store: Arc<JobStore>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { store, dispatcher }
    }

    /// Create a child job remixing `parent_job_id` with a new prompt.
    ///
    /// Fails with [`EngineError::ParentNotReady`] for every parent state
    /// other than `completed`. The child copies the parent's model, size,
    /// and duration, and follows the identical state machine.
    pub async fn remix(
        &self,
        parent_job_id: JobId,
        prompt: String,
    ) -> Result<JobRecord, EngineError> {
        let parent = self
            .store
            .get(parent_job_id)
            .await
            .ok_or(EngineError::JobNotFound(parent_job_id))?;

        if parent.state != JobState::Completed {
            return Err(EngineError::ParentNotReady {
                state: parent.state,
            });
        }

        tracing::info!(
            parent_job_id = %parent_job_id,
            "Creating remix job",
        );

        let request = GenerationRequest {
            prompt,
            model: parent.request.model.clone(),
            size: parent.request.size.clone(),
            duration_secs: parent.request.duration_secs,
            reference_image_url: None,
            parent_job_id: Some(parent_job_id),
        };

        self.dispatcher.dispatch(request).await
    }
}
