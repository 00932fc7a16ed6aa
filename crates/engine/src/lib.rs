//! Job orchestration and reconciliation engine.
//!
//! Owns the job lifecycle end to end: the dispatcher creates records and
//! submits them to the provider, the webhook ingestor and status poller
//! both feed the reconciler, and the reconciler is the only component
//! that transitions job state -- under per-record optimistic concurrency,
//! never holding a lock across provider I/O. The remix coordinator and
//! artifact resolver read terminal records to spawn derived jobs and
//! serve downloads.

pub mod artifacts;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod poller;
pub mod reconciler;
pub mod remix;
pub mod webhook;

pub use artifacts::ArtifactResolver;
pub use dispatcher::Dispatcher;
pub use error::EngineError;
pub use event::ReconcileEvent;
pub use poller::{PollerConfig, StatusPoller};
pub use reconciler::{Outcome, Reconciler};
pub use remix::RemixCoordinator;
pub use webhook::{Ingested, WebhookError, WebhookIngestor, SIGNATURE_HEADER};
