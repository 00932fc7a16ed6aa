//! Reconciliation events and their ordinal fencing.
//!
//! A reconciliation event is the normalized form of a status signal from
//! either source of truth (webhook or poll). Events carry no trustworthy
//! provider-side sequence number, so each is assigned a deterministic
//! ordinal derived from the (state, progress) pair it proposes:
//! duplicates compare equal, regressions compare lower, and forward
//! motion is strictly increasing. The reconciler rejects any event whose
//! ordinal does not exceed the record's `last_event_seq`.

use std::collections::BTreeMap;

use vidra_core::artifacts::ArtifactKind;
use vidra_core::classify::JobError;
use vidra_core::lifecycle::JobState;
use vidra_provider::{ProviderJobStatus, ProviderState};

/// Ordinal for an event proposing `state` at `progress` percent.
///
/// State ranks: submitted = 1, processing = 2, terminal = 3. Progress
/// (clamped to 100) breaks ties within a rank.
pub const fn event_ordinal(state: JobState, progress: u8) -> u64 {
    let rank: u64 = match state {
        JobState::Pending => 0,
        JobState::Submitted => 1,
        JobState::Processing => 2,
        JobState::Completed | JobState::Failed | JobState::Expired => 3,
    };
    let progress = if progress > 100 { 100 } else { progress };
    rank * 1000 + progress as u64
}

/// Sequence value the dispatcher records on `pending -> submitted`.
pub const SUBMISSION_SEQ: u64 = event_ordinal(JobState::Submitted, 0);

/// A normalized status update for one job, from either signal source.
#[derive(Debug, Clone)]
pub struct ReconcileEvent {
    /// Provider-side identifier the signal referred to.
    pub provider_job_id: String,
    /// State the event proposes.
    pub proposed_state: JobState,
    /// Progress the event proposes (meaningful for non-terminal states).
    pub progress: u8,
    /// Ordinal fence; see [`event_ordinal`].
    pub ordinal: u64,
    /// Artifact fetch tokens, populated on completion events.
    pub artifact_refs: BTreeMap<ArtifactKind, String>,
    /// Classified error, populated on failure/expiry events.
    pub error: Option<JobError>,
}

impl ReconcileEvent {
    /// A non-terminal progress/state update.
    pub fn status_update(
        provider_job_id: impl Into<String>,
        state: JobState,
        progress: u8,
    ) -> Self {
        let progress = progress.min(100);
        Self {
            provider_job_id: provider_job_id.into(),
            proposed_state: state,
            progress,
            ordinal: event_ordinal(state, progress),
            artifact_refs: BTreeMap::new(),
            error: None,
        }
    }

    /// A completion event. When the signal carried no artifact tokens,
    /// the three standard variant tokens are assumed -- the provider
    /// addresses artifacts by variant name.
    pub fn completed(
        provider_job_id: impl Into<String>,
        artifact_refs: BTreeMap<ArtifactKind, String>,
    ) -> Self {
        let artifact_refs = if artifact_refs.is_empty() {
            Self::default_artifact_refs()
        } else {
            artifact_refs
        };
        Self {
            provider_job_id: provider_job_id.into(),
            proposed_state: JobState::Completed,
            progress: 100,
            ordinal: event_ordinal(JobState::Completed, 100),
            artifact_refs,
            error: None,
        }
    }

    /// A terminal failure event.
    pub fn failed(provider_job_id: impl Into<String>, error: JobError) -> Self {
        Self {
            provider_job_id: provider_job_id.into(),
            proposed_state: JobState::Failed,
            progress: 0,
            ordinal: event_ordinal(JobState::Failed, 0),
            artifact_refs: BTreeMap::new(),
            error: Some(error),
        }
    }

    /// The synthetic expiry event the poller emits for over-age jobs.
    pub fn expired(provider_job_id: impl Into<String>) -> Self {
        Self {
            provider_job_id: provider_job_id.into(),
            proposed_state: JobState::Expired,
            progress: 0,
            ordinal: event_ordinal(JobState::Expired, 0),
            artifact_refs: BTreeMap::new(),
            error: Some(JobError::timeout()),
        }
    }

    /// Map a poll response into an event.
    pub fn from_poll(provider_job_id: &str, status: &ProviderJobStatus) -> Self {
        match status.state {
            ProviderState::Completed => Self::completed(provider_job_id, BTreeMap::new()),
            ProviderState::Failed => Self::failed(
                provider_job_id,
                JobError::generation_failed(
                    status
                        .error
                        .clone()
                        .unwrap_or_else(|| "Video generation failed".to_string()),
                ),
            ),
            other => Self::status_update(provider_job_id, other.to_job_state(), status.progress),
        }
    }

    /// One token per standard artifact variant.
    pub fn default_artifact_refs() -> BTreeMap<ArtifactKind, String> {
        ArtifactKind::ALL
            .into_iter()
            .map(|kind| (kind, kind.as_str().to_string()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
