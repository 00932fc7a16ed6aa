//! The state-transition authority.
//!
//! Both signal sources (webhook ingestor and status poller) hand their
//! events here. The reconciler is the only component that moves a job
//! past `submitted`, and it does so under optimistic concurrency: the
//! transition rules run against a snapshot, then commit via
//! compare-and-swap on `last_event_seq`. A lost race is re-read and
//! retried once; a second loss means a newer event already won and the
//! current one is dropped.

use std::sync::Arc;

use vidra_core::lifecycle::JobState;
use vidra_store::{JobRecord, JobStore, StoreError};

use crate::event::ReconcileEvent;

/// What the reconciler did with an event.
#[derive(Debug)]
pub enum Outcome {
    /// The transition was applied; the updated record is returned.
    Applied(JobRecord),
    /// The event's ordinal did not exceed the record's fence
    /// (duplicate delivery or an older signal arriving late).
    Stale { ordinal: u64, last_event_seq: u64 },
    /// The proposed state is not a valid edge from the current state
    /// (out-of-order delivery across a terminal transition).
    InvalidTransition { from: JobState, to: JobState },
    /// No record matches the event's provider job id.
    UnknownJob,
    /// Two consecutive CAS losses; a newer event won the race.
    DroppedOnConflict,
}

/// Applies reconciliation events to the job store.
pub struct Reconciler {
    store: Arc<JobStore>,
}

impl Reconciler {
    pub fn new(store: Arc<JobStore>) -> Self {
        Self { store }
    }

    /// Apply one reconciliation event.
    ///
    /// Transition rule, in order:
    /// 1. Resolve the record by provider job id; unknown ids are logged
    ///    and dropped (a notification may outlive its job).
    /// 2. Reject events whose ordinal does not exceed `last_event_seq`.
    /// 3. Reject proposed states that are not valid outbound edges.
    /// 4. Reject non-terminal events proposing a progress regression.
    /// 5. Commit via compare-and-swap; on conflict re-read and retry
    ///    once, then drop.
    pub async fn apply(&self, event: ReconcileEvent) -> Outcome {
        let Some(mut record) = self.store.find_by_provider_id(&event.provider_job_id).await
        else {
            tracing::warn!(
                provider_job_id = %event.provider_job_id,
                proposed_state = %event.proposed_state,
                "Reconciliation event for unknown job, dropping",
            );
            return Outcome::UnknownJob;
        };

        let mut retried = false;
        loop {
            if event.ordinal <= record.last_event_seq {
                tracing::debug!(
                    job_id = %record.job_id,
                    ordinal = event.ordinal,
                    last_event_seq = record.last_event_seq,
                    "Stale or duplicate event, dropping",
                );
                return Outcome::Stale {
                    ordinal: event.ordinal,
                    last_event_seq: record.last_event_seq,
                };
            }

            if !record.state.can_transition(event.proposed_state) {
                tracing::debug!(
                    job_id = %record.job_id,
                    from = %record.state,
                    to = %event.proposed_state,
                    "Out-of-order event proposes invalid transition, dropping",
                );
                return Outcome::InvalidTransition {
                    from: record.state,
                    to: event.proposed_state,
                };
            }

            // Progress never regresses while a job is live.
            if matches!(
                event.proposed_state,
                JobState::Submitted | JobState::Processing
            ) && event.progress < record.progress
            {
                tracing::debug!(
                    job_id = %record.job_id,
                    recorded = record.progress,
                    proposed = event.progress,
                    "Event proposes lower progress, dropping as stale",
                );
                return Outcome::Stale {
                    ordinal: event.ordinal,
                    last_event_seq: record.last_event_seq,
                };
            }

            let result = self
                .store
                .compare_and_swap(record.job_id, record.last_event_seq, |rec| {
                    apply_event(rec, &event)
                })
                .await;

            match result {
                Ok(updated) => {
                    tracing::info!(
                        job_id = %updated.job_id,
                        state = %updated.state,
                        progress = updated.progress,
                        ordinal = event.ordinal,
                        "Reconciliation event applied",
                    );
                    return Outcome::Applied(updated);
                }
                Err(StoreError::Conflict { .. }) if !retried => {
                    retried = true;
                    match self.store.find_by_provider_id(&event.provider_job_id).await {
                        Some(fresh) => record = fresh,
                        None => return Outcome::UnknownJob,
                    }
                }
                Err(StoreError::Conflict { .. }) => {
                    tracing::debug!(
                        job_id = %record.job_id,
                        ordinal = event.ordinal,
                        "Second CAS conflict, dropping event (newer event won)",
                    );
                    return Outcome::DroppedOnConflict;
                }
                Err(StoreError::NotFound { .. }) => return Outcome::UnknownJob,
            }
        }
    }
}

/// Mutation committed under the store's write lock. Must stay I/O-free.
fn apply_event(record: &mut JobRecord, event: &ReconcileEvent) {
    record.state = event.proposed_state;
    record.last_event_seq = event.ordinal;
    match event.proposed_state {
        JobState::Completed => {
            record.progress = 100;
            record.artifact_refs = event.artifact_refs.clone();
        }
        JobState::Failed | JobState::Expired => {
            record.error = event.error.clone();
        }
        _ => {
            record.progress = event.progress;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use assert_matches::assert_matches;
    use vidra_core::classify::{FailureClass, JobError, JobErrorKind};
    use vidra_core::request::{
        GenerationRequest, DEFAULT_DURATION_SECS, DEFAULT_MODEL, DEFAULT_SIZE,
    };

    use super::*;
    use crate::event::SUBMISSION_SEQ;

    fn request() -> GenerationRequest {
        GenerationRequest {
            prompt: "time-lapse of a city at night".to_string(),
            model: DEFAULT_MODEL.to_string(),
            size: DEFAULT_SIZE.to_string(),
            duration_secs: DEFAULT_DURATION_SECS,
            reference_image_url: None,
            parent_job_id: None,
        }
    }

    /// Create a store holding one submitted job with the given provider id.
    async fn store_with_submitted_job(provider_job_id: &str) -> (Arc<JobStore>, JobRecord) {
        let store = Arc::new(JobStore::new());
        let created = store.create(request()).await;
        let submitted = store
            .compare_and_swap(created.job_id, 0, |rec| {
                rec.state = JobState::Submitted;
                rec.provider_job_id = Some(provider_job_id.to_string());
                rec.last_event_seq = SUBMISSION_SEQ;
            })
            .await
            .unwrap();
        (store, submitted)
    }

    #[tokio::test]
    async fn processing_event_applies() {
        let (store, _) = store_with_submitted_job("vid_1").await;
        let reconciler = Reconciler::new(Arc::clone(&store));

        let outcome = reconciler
            .apply(ReconcileEvent::status_update("vid_1", JobState::Processing, 40))
            .await;

        assert_matches!(outcome, Outcome::Applied(record) => {
            assert_eq!(record.state, JobState::Processing);
            assert_eq!(record.progress, 40);
        });
    }

    #[tokio::test]
    async fn duplicate_event_is_stale() {
        let (store, _) = store_with_submitted_job("vid_1").await;
        let reconciler = Reconciler::new(Arc::clone(&store));

        let first = reconciler
            .apply(ReconcileEvent::status_update("vid_1", JobState::Processing, 40))
            .await;
        assert_matches!(first, Outcome::Applied(_));

        // Identical event re-delivered (webhook retry or racing poll).
        let second = reconciler
            .apply(ReconcileEvent::status_update("vid_1", JobState::Processing, 40))
            .await;
        assert_matches!(second, Outcome::Stale { .. });
    }

    #[tokio::test]
    async fn progress_regression_is_stale() {
        let (store, _) = store_with_submitted_job("vid_1").await;
        let reconciler = Reconciler::new(Arc::clone(&store));

        reconciler
            .apply(ReconcileEvent::status_update("vid_1", JobState::Processing, 60))
            .await;
        let outcome = reconciler
            .apply(ReconcileEvent::status_update("vid_1", JobState::Processing, 30))
            .await;

        assert_matches!(outcome, Outcome::Stale { .. });
        let record = store.find_by_provider_id("vid_1").await.unwrap();
        assert_eq!(record.progress, 60);
    }

    #[tokio::test]
    async fn completion_populates_artifact_refs() {
        let (store, _) = store_with_submitted_job("vid_1").await;
        let reconciler = Reconciler::new(Arc::clone(&store));

        let outcome = reconciler
            .apply(ReconcileEvent::completed("vid_1", BTreeMap::new()))
            .await;

        assert_matches!(outcome, Outcome::Applied(record) => {
            assert_eq!(record.state, JobState::Completed);
            assert_eq!(record.progress, 100);
            assert_eq!(record.artifact_refs.len(), 3);
        });
    }

    #[tokio::test]
    async fn processing_after_completed_is_invalid_transition() {
        let (store, _) = store_with_submitted_job("vid_1").await;
        let reconciler = Reconciler::new(Arc::clone(&store));

        reconciler
            .apply(ReconcileEvent::completed("vid_1", BTreeMap::new()))
            .await;

        // A stale processing signal arriving after completion. Its
        // ordinal is lower, so the fence catches it first.
        let outcome = reconciler
            .apply(ReconcileEvent::status_update("vid_1", JobState::Processing, 90))
            .await;
        assert_matches!(outcome, Outcome::Stale { .. });

        let record = store.find_by_provider_id("vid_1").await.unwrap();
        assert_eq!(record.state, JobState::Completed);
    }

    #[tokio::test]
    async fn late_completion_after_expiry_is_dropped() {
        let (store, _) = store_with_submitted_job("vid_1").await;
        let reconciler = Reconciler::new(Arc::clone(&store));

        let expired = reconciler.apply(ReconcileEvent::expired("vid_1")).await;
        assert_matches!(expired, Outcome::Applied(record) => {
            assert_eq!(record.state, JobState::Expired);
            assert_eq!(record.error.as_ref().unwrap().kind, JobErrorKind::Timeout);
        });

        // The provider finished after all; the completion outranks the
        // expiry ordinal but expired has no outbound edges.
        let late = reconciler
            .apply(ReconcileEvent::completed("vid_1", BTreeMap::new()))
            .await;
        assert_matches!(
            late,
            Outcome::InvalidTransition { from: JobState::Expired, to: JobState::Completed }
        );

        let record = store.find_by_provider_id("vid_1").await.unwrap();
        assert_eq!(record.state, JobState::Expired);
        assert!(record.artifact_refs.is_empty());
    }

    #[tokio::test]
    async fn failure_event_records_classified_error() {
        let (store, _) = store_with_submitted_job("vid_1").await;
        let reconciler = Reconciler::new(Arc::clone(&store));

        let outcome = reconciler
            .apply(ReconcileEvent::failed(
                "vid_1",
                JobError::generation_failed("rejected: content policy violation"),
            ))
            .await;

        assert_matches!(outcome, Outcome::Applied(record) => {
            assert_eq!(record.state, JobState::Failed);
            let error = record.error.as_ref().unwrap();
            assert_eq!(error.kind, JobErrorKind::GenerationFailed);
            assert_eq!(error.class, Some(FailureClass::ContentPolicy));
        });
    }

    #[tokio::test]
    async fn unknown_provider_id_is_dropped() {
        let (store, _) = store_with_submitted_job("vid_1").await;
        let reconciler = Reconciler::new(Arc::clone(&store));

        let outcome = reconciler
            .apply(ReconcileEvent::status_update("vid_other", JobState::Processing, 10))
            .await;
        assert_matches!(outcome, Outcome::UnknownJob);
    }

    #[tokio::test]
    async fn whichever_terminal_event_lands_first_wins() {
        // Poll discovers completion before the webhook arrives.
        let (store, _) = store_with_submitted_job("vid_1").await;
        let reconciler = Reconciler::new(Arc::clone(&store));

        let poll = reconciler
            .apply(ReconcileEvent::completed("vid_1", BTreeMap::new()))
            .await;
        assert_matches!(poll, Outcome::Applied(_));

        let webhook = reconciler
            .apply(ReconcileEvent::completed("vid_1", BTreeMap::new()))
            .await;
        assert_matches!(webhook, Outcome::Stale { .. });
    }

    #[tokio::test]
    async fn final_state_is_independent_of_delivery_order() {
        // The same event set, delivered shuffled and with duplicates,
        // must converge on the highest-ordinal valid transition.
        for order in [
            [40u8, 10, 55, 40, 25, 70],
            [70, 55, 40, 40, 25, 10],
            [10, 70, 25, 55, 40, 40],
        ] {
            let (store, _) = store_with_submitted_job("vid_1").await;
            let reconciler = Reconciler::new(Arc::clone(&store));

            for progress in order {
                reconciler
                    .apply(ReconcileEvent::status_update(
                        "vid_1",
                        JobState::Processing,
                        progress,
                    ))
                    .await;
            }

            let record = store.find_by_provider_id("vid_1").await.unwrap();
            assert_eq!(record.state, JobState::Processing);
            assert_eq!(record.progress, 70, "order {order:?}");
        }
    }

    #[tokio::test]
    async fn racing_terminal_and_progress_events_resolve_without_loss() {
        // Webhook completion and a poll progress update race. With two
        // writers the completion can lose at most one CAS, so its single
        // retry always lands; the progress event either applied first or
        // is fenced out.
        let (store, _) = store_with_submitted_job("vid_1").await;
        let reconciler = Arc::new(Reconciler::new(Arc::clone(&store)));

        let webhook = {
            let reconciler = Arc::clone(&reconciler);
            tokio::spawn(async move {
                reconciler
                    .apply(ReconcileEvent::completed("vid_1", BTreeMap::new()))
                    .await
            })
        };
        let poll = {
            let reconciler = Arc::clone(&reconciler);
            tokio::spawn(async move {
                reconciler
                    .apply(ReconcileEvent::status_update(
                        "vid_1",
                        JobState::Processing,
                        80,
                    ))
                    .await
            })
        };
        webhook.await.unwrap();
        poll.await.unwrap();

        let record = store.find_by_provider_id("vid_1").await.unwrap();
        assert_eq!(record.state, JobState::Completed);
        assert_eq!(record.progress, 100);
        assert_eq!(record.artifact_refs.len(), 3);
    }
}
