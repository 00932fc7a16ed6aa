//! Engine-level error type.

use vidra_core::error::CoreError;
use vidra_core::lifecycle::JobState;
use vidra_core::types::JobId;
use vidra_provider::ProviderError;
use vidra_store::StoreError;

/// Errors surfaced by the orchestration engine.
///
/// Provider faults during polling never appear here -- the poller absorbs
/// them and escalates through job state instead. This type covers the
/// request-path operations (dispatch, remix, artifact fetch).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A domain-level error (validation, etc.).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A store-level error (lost CAS race on the request path).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A provider error on a caller-facing path (artifact fetch).
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// No job record for the given id.
    #[error("Job {0} not found")]
    JobNotFound(JobId),

    /// Remix requested against a parent that is not `completed`.
    #[error("Parent job is not completed (state: {state})")]
    ParentNotReady { state: JobState },

    /// Artifact requested before the job completed.
    #[error("Job artifacts are not ready (state: {state})")]
    NotReady { state: JobState },

    /// An invariant was violated; indicates a bug, not caller error.
    #[error("Internal error: {0}")]
    Internal(String),
}
