//! Job record entity and its caller-facing projection.

use std::collections::BTreeMap;

use serde::Serialize;
use vidra_core::artifacts::ArtifactKind;
use vidra_core::classify::JobError;
use vidra_core::lifecycle::JobState;
use vidra_core::request::GenerationRequest;
use vidra_core::types::{JobId, Timestamp};

/// One tracked video generation job.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    /// Caller-facing identifier, minted at creation. Immutable.
    pub job_id: JobId,
    /// Provider-assigned identifier. Set exactly once by the dispatcher
    /// on successful submission; `None` while `pending` and on
    /// submission-rejected jobs.
    pub provider_job_id: Option<String>,
    /// Current lifecycle state.
    pub state: JobState,
    /// Completion percentage; non-decreasing while non-terminal,
    /// forced to 100 on completion.
    pub progress: u8,
    /// The normalized request that produced this job.
    pub request: GenerationRequest,
    /// Parent job for remixes. Acyclic by construction: a parent must be
    /// `completed` before a child referencing it can exist.
    pub parent_job_id: Option<JobId>,
    /// Provider-side fetch tokens per artifact kind. Non-empty iff
    /// `completed` (lazily back-filled by the artifact resolver when a
    /// completion event carried none).
    pub artifact_refs: BTreeMap<ArtifactKind, String>,
    /// Ordinal of the highest reconciliation event applied. The
    /// compare-and-swap fence: every mutation supplies the value it
    /// observed.
    pub last_event_seq: u64,
    /// Classified error; populated only on `failed`/`expired`.
    pub error: Option<JobError>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl JobRecord {
    /// Create a fresh `pending` record for a request.
    pub fn new(request: GenerationRequest) -> Self {
        let now = chrono::Utc::now();
        Self {
            job_id: uuid::Uuid::new_v4(),
            provider_job_id: None,
            state: JobState::Pending,
            progress: 0,
            parent_job_id: request.parent_job_id,
            request,
            artifact_refs: BTreeMap::new(),
            last_event_seq: 0,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Seconds since the record was created.
    pub fn age_secs(&self, now: Timestamp) -> i64 {
        (now - self.created_at).num_seconds()
    }

    /// Caller-facing projection of this record.
    pub fn view(&self) -> JobView {
        JobView {
            job_id: self.job_id,
            state: self.state,
            progress: self.progress,
            model: self.request.model.clone(),
            size: self.request.size.clone(),
            duration_secs: self.request.duration_secs,
            parent_job_id: self.parent_job_id,
            error: self.error.clone(),
            artifacts: self.artifact_refs.keys().copied().collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Projection returned by the job query endpoints.
///
/// Exposes artifact availability (which kinds are resolvable) without
/// leaking the provider-side fetch tokens.
#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    pub job_id: JobId,
    pub state: JobState,
    pub progress: u8,
    pub model: String,
    pub size: String,
    pub duration_secs: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_job_id: Option<JobId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,
    pub artifacts: Vec<ArtifactKind>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
