//! Job lifecycle state machine.
//!
//! A job moves `pending -> submitted -> processing -> completed`, with
//! `failed` reachable from any non-terminal state and `expired` reachable
//! only from `submitted`/`processing` (poller timeout). Terminal states
//! have no outbound edges; the reconciler enforces this via
//! [`JobState::can_transition`].

use serde::{Deserialize, Serialize};

/// Lifecycle state of a generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Created locally, not yet accepted by the provider.
    Pending,
    /// Accepted by the provider; a provider job id exists.
    Submitted,
    /// The provider reports active generation.
    Processing,
    /// Generation finished; artifacts are resolvable.
    Completed,
    /// Generation failed (provider error, submission rejection, or
    /// exhausted retries).
    Failed,
    /// Force-terminated by the poller after exceeding the maximum job age.
    Expired,
}

impl JobState {
    /// String representation used in API responses and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Submitted => "submitted",
            JobState::Processing => "processing",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Expired => "expired",
        }
    }

    /// Whether this state has no outbound edges.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Expired
        )
    }

    /// Whether `self -> to` is a valid edge of the state machine.
    ///
    /// `pending -> submitted | failed` is reserved for the dispatcher (the
    /// only writer before a provider id exists); everything else is owned
    /// by the reconciler.
    pub fn can_transition(self, to: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, to),
            (Pending, Submitted)
                | (Pending, Failed)
                | (Submitted, Processing)
                | (Submitted, Completed)
                | (Submitted, Failed)
                | (Submitted, Expired)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Processing, Expired)
        )
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
