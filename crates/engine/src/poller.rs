//! Periodic status reconciliation against the provider.
//!
//! A single long-lived task polls every job still in
//! `submitted`/`processing`, translates responses into reconciliation
//! events, and expires jobs the provider silently dropped. Poll failures
//! are absorbed with per-job exponential backoff; only after
//! `failure_cap` consecutive misses does a job fail with
//! `provider_unreachable`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use vidra_core::backoff::{poll_backoff_ticks, MAX_CONSECUTIVE_POLL_FAILURES};
use vidra_core::classify::JobError;
use vidra_core::lifecycle::JobState;
use vidra_core::types::JobId;
use vidra_provider::ProviderAdapter;
use vidra_store::JobStore;

use crate::event::ReconcileEvent;
use crate::reconciler::Reconciler;

/// Default interval between poll cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default maximum age before a non-terminal job is expired.
pub const DEFAULT_MAX_JOB_AGE_SECS: i64 = 3600;

/// Poller tuning knobs.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Interval between poll cycles.
    pub interval: Duration,
    /// Jobs non-terminal past this age are force-expired.
    pub max_job_age_secs: i64,
    /// Consecutive poll failures before a job is marked failed.
    pub failure_cap: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_job_age_secs: DEFAULT_MAX_JOB_AGE_SECS,
            failure_cap: MAX_CONSECUTIVE_POLL_FAILURES,
        }
    }
}

/// Per-job retry bookkeeping, private to the poller task.
#[derive(Default)]
struct BackoffEntry {
    consecutive_failures: u32,
    skip_ticks: u32,
}

/// The polling source of truth.
///
/// Owns its backoff map outright -- job records only ever carry
/// reconciler-owned state.
pub struct StatusPoller {
    store: Arc<JobStore>,
    provider: Arc<dyn ProviderAdapter>,
    reconciler: Arc<Reconciler>,
    config: PollerConfig,
    backoff: HashMap<JobId, BackoffEntry>,
}

impl StatusPoller {
    pub fn new(
        store: Arc<JobStore>,
        provider: Arc<dyn ProviderAdapter>,
        reconciler: Arc<Reconciler>,
        config: PollerConfig,
    ) -> Self {
        Self {
            store,
            provider,
            reconciler,
            config,
            backoff: HashMap::new(),
        }
    }

    /// Run the poll loop until the cancellation token is triggered.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.interval);
        tracing::info!(
            interval_ms = self.config.interval.as_millis() as u64,
            max_job_age_secs = self.config.max_job_age_secs,
            failure_cap = self.config.failure_cap,
            "Status poller started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Status poller shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// One poll cycle over all non-terminal jobs.
    pub async fn tick(&mut self) {
        let now = chrono::Utc::now();
        let candidates = self
            .store
            .list_in_states(&[JobState::Submitted, JobState::Processing])
            .await;

        // Drop bookkeeping for jobs that reached a terminal state (or
        // were deleted) since the last cycle.
        self.backoff
            .retain(|job_id, _| candidates.iter().any(|r| r.job_id == *job_id));

        for job in candidates {
            // Invariant: submitted/processing records carry a provider id.
            let Some(provider_job_id) = job.provider_job_id.clone() else {
                continue;
            };

            if job.age_secs(now) >= self.config.max_job_age_secs {
                tracing::warn!(
                    job_id = %job.job_id,
                    age_secs = job.age_secs(now),
                    "Job exceeded maximum age, expiring",
                );
                self.reconciler
                    .apply(ReconcileEvent::expired(provider_job_id))
                    .await;
                self.backoff.remove(&job.job_id);
                continue;
            }

            if let Some(entry) = self.backoff.get_mut(&job.job_id) {
                if entry.skip_ticks > 0 {
                    entry.skip_ticks -= 1;
                    continue;
                }
            }

            match self.provider.fetch_status(&provider_job_id).await {
                Ok(status) => {
                    self.backoff.remove(&job.job_id);
                    self.reconciler
                        .apply(ReconcileEvent::from_poll(&provider_job_id, &status))
                        .await;
                }
                Err(e) => {
                    let failures = {
                        let entry = self.backoff.entry(job.job_id).or_default();
                        entry.consecutive_failures += 1;
                        entry.skip_ticks = poll_backoff_ticks(entry.consecutive_failures);
                        entry.consecutive_failures
                    };

                    if failures >= self.config.failure_cap {
                        tracing::error!(
                            job_id = %job.job_id,
                            failures,
                            error = %e,
                            "Poll failure cap reached, marking job failed",
                        );
                        self.backoff.remove(&job.job_id);
                        self.reconciler
                            .apply(ReconcileEvent::failed(
                                provider_job_id,
                                JobError::provider_unreachable(e.message()),
                            ))
                            .await;
                    } else {
                        tracing::warn!(
                            job_id = %job.job_id,
                            failures,
                            error = %e,
                            "Poll failed, backing off",
                        );
                    }
                }
            }
        }
    }
}
