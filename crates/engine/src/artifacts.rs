//! On-demand artifact resolution with an in-process byte cache.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use vidra_core::artifacts::ArtifactKind;
use vidra_core::lifecycle::JobState;
use vidra_core::types::JobId;
use vidra_provider::ProviderAdapter;
use vidra_store::JobStore;

use crate::error::EngineError;

/// Resolves artifact bytes for completed jobs.
///
/// Bytes are cached for the lifetime of the process so repeated
/// downloads never re-fetch from the provider.
pub struct ArtifactResolver {
    store: Arc<JobStore>,
    provider: Arc<dyn ProviderAdapter>,
    cache: RwLock<HashMap<(JobId, ArtifactKind), Arc<Vec<u8>>>>,
}

impl ArtifactResolver {
    pub fn new(store: Arc<JobStore>, provider: Arc<dyn ProviderAdapter>) -> Self {
        Self {
            store,
            provider,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch the bytes of one artifact of a completed job.
    ///
    /// Fails with [`EngineError::NotReady`] unless the job is
    /// `completed`. The stored fetch token is resolved through the
    /// provider adapter; a completed record missing its refs (legacy or
    /// race) has them lazily back-filled -- the one permitted mutation on
    /// a terminal record.
    pub async fn fetch(
        &self,
        job_id: JobId,
        kind: ArtifactKind,
    ) -> Result<Arc<Vec<u8>>, EngineError> {
        if let Some(bytes) = self.cache.read().await.get(&(job_id, kind)) {
            return Ok(Arc::clone(bytes));
        }

        let record = self
            .store
            .get(job_id)
            .await
            .ok_or(EngineError::JobNotFound(job_id))?;

        if record.state != JobState::Completed {
            return Err(EngineError::NotReady {
                state: record.state,
            });
        }

        // Invariant: a completed job always has a provider id.
        let provider_job_id = record.provider_job_id.clone().ok_or_else(|| {
            EngineError::Internal(format!("Completed job {job_id} has no provider id"))
        })?;

        let token = match record.artifact_refs.get(&kind) {
            Some(token) => token.clone(),
            None => {
                let token = kind.as_str().to_string();
                // Best-effort back-fill; a lost race just means another
                // writer already recorded a token.
                let backfill = self
                    .store
                    .compare_and_swap(job_id, record.last_event_seq, |rec| {
                        rec.artifact_refs.insert(kind, token.clone());
                    })
                    .await;
                if let Err(e) = backfill {
                    tracing::debug!(job_id = %job_id, error = %e, "Artifact ref back-fill skipped");
                }
                token
            }
        };

        let bytes = Arc::new(self.provider.fetch_artifact(&provider_job_id, &token).await?);

        tracing::info!(
            job_id = %job_id,
            kind = %kind,
            size_bytes = bytes.len(),
            "Artifact fetched and cached",
        );

        self.cache
            .write()
            .await
            .insert((job_id, kind), Arc::clone(&bytes));

        Ok(bytes)
    }
}
