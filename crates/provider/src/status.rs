//! Normalized provider status shapes.

use vidra_core::lifecycle::JobState;

/// Closed set of provider-side job states.
///
/// Providers report status under varying names ("processing" vs
/// "in_progress", "pending" vs "queued"); [`ProviderState::parse`]
/// folds them into these four variants at the adapter boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    /// Accepted, waiting for capacity.
    Queued,
    /// Actively generating.
    InProgress,
    /// Finished successfully; artifacts downloadable.
    Completed,
    /// Finished unsuccessfully.
    Failed,
}

impl ProviderState {
    /// Parse a provider status string. Returns `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" | "pending" => Some(ProviderState::Queued),
            "in_progress" | "processing" | "running" => Some(ProviderState::InProgress),
            "completed" | "succeeded" => Some(ProviderState::Completed),
            "failed" | "error" => Some(ProviderState::Failed),
            _ => None,
        }
    }

    /// The job state this provider state proposes.
    pub fn to_job_state(self) -> JobState {
        match self {
            ProviderState::Queued => JobState::Submitted,
            ProviderState::InProgress => JobState::Processing,
            ProviderState::Completed => JobState::Completed,
            ProviderState::Failed => JobState::Failed,
        }
    }
}

/// Normalized result of a status fetch.
#[derive(Debug, Clone)]
pub struct ProviderJobStatus {
    pub state: ProviderState,
    /// Completion percentage as reported by the provider.
    pub progress: u8,
    /// Failure message, present when `state` is [`ProviderState::Failed`].
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
