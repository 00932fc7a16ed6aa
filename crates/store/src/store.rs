//! The in-process job table behind a compare-and-swap interface.

use std::collections::HashMap;

use tokio::sync::RwLock;
use vidra_core::lifecycle::JobState;
use vidra_core::request::GenerationRequest;
use vidra_core::types::JobId;

use crate::record::JobRecord;

/// Errors from store mutations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record exists for the given job id.
    #[error("Job {job_id} not found")]
    NotFound { job_id: JobId },

    /// A concurrent writer applied a newer event between the caller's
    /// read and its compare-and-swap. The caller must re-read and retry
    /// or drop its event.
    #[error("Concurrent update on job {job_id}: expected seq {expected}, found {found}")]
    Conflict {
        job_id: JobId,
        expected: u64,
        found: u64,
    },
}

/// Both maps live under one lock so the provider-id index can never
/// disagree with the job table.
#[derive(Default)]
struct Inner {
    jobs: HashMap<JobId, JobRecord>,
    by_provider_id: HashMap<String, JobId>,
}

/// In-process table of job records.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc`
/// and shared across the dispatcher, reconciler, poller, and handlers.
/// Mutation closures run under the write lock and must not perform I/O.
pub struct JobStore {
    inner: RwLock<Inner>,
}

impl JobStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Create a `pending` record for a request and return a copy.
    pub async fn create(&self, request: GenerationRequest) -> JobRecord {
        let record = JobRecord::new(request);
        let mut inner = self.inner.write().await;
        inner.jobs.insert(record.job_id, record.clone());
        record
    }

    /// Fetch a record by its caller-facing id.
    pub async fn get(&self, job_id: JobId) -> Option<JobRecord> {
        self.inner.read().await.jobs.get(&job_id).cloned()
    }

    /// Fetch a record by its provider-assigned id.
    pub async fn find_by_provider_id(&self, provider_job_id: &str) -> Option<JobRecord> {
        let inner = self.inner.read().await;
        let job_id = inner.by_provider_id.get(provider_job_id)?;
        inner.jobs.get(job_id).cloned()
    }

    /// All records, newest first.
    pub async fn list(&self) -> Vec<JobRecord> {
        let inner = self.inner.read().await;
        let mut records: Vec<_> = inner.jobs.values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    /// Records currently in any of the given states. Used by the poller
    /// to select candidates.
    pub async fn list_in_states(&self, states: &[JobState]) -> Vec<JobRecord> {
        self.inner
            .read()
            .await
            .jobs
            .values()
            .filter(|r| states.contains(&r.state))
            .cloned()
            .collect()
    }

    /// Apply a mutation to a record iff its `last_event_seq` still equals
    /// `expected_seq`.
    ///
    /// On success the mutated record (with a refreshed `updated_at`) is
    /// returned and, if the mutation set a provider id, the provider-id
    /// index is updated. On [`StoreError::Conflict`] a concurrent writer
    /// won; the caller re-reads and retries or drops its event.
    pub async fn compare_and_swap(
        &self,
        job_id: JobId,
        expected_seq: u64,
        mutate: impl FnOnce(&mut JobRecord),
    ) -> Result<JobRecord, StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .jobs
            .get_mut(&job_id)
            .ok_or(StoreError::NotFound { job_id })?;

        if record.last_event_seq != expected_seq {
            return Err(StoreError::Conflict {
                job_id,
                expected: expected_seq,
                found: record.last_event_seq,
            });
        }

        let provider_id_before = record.provider_job_id.clone();
        mutate(record);
        record.updated_at = chrono::Utc::now();
        let updated = record.clone();

        if provider_id_before.is_none() {
            if let Some(ref provider_id) = updated.provider_job_id {
                inner.by_provider_id.insert(provider_id.clone(), job_id);
            }
        }

        Ok(updated)
    }

    /// Remove a record (and its provider-id index entry). Returns the
    /// removed record, or `None` if the job was unknown.
    pub async fn remove(&self, job_id: JobId) -> Option<JobRecord> {
        let mut inner = self.inner.write().await;
        let record = inner.jobs.remove(&job_id)?;
        if let Some(ref provider_id) = record.provider_job_id {
            inner.by_provider_id.remove(provider_id);
        }
        Some(record)
    }

    /// Number of records currently tracked.
    pub async fn len(&self) -> usize {
        self.inner.read().await.jobs.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.jobs.is_empty()
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
