//! Job Record Store: the in-process table of job state.
//!
//! The store is the single shared mutable resource of the service. All
//! mutation after creation goes through [`JobStore::compare_and_swap`],
//! keyed on a record's `last_event_seq`, so concurrent writers (webhook
//! ingestion vs. status polling) resolve by optimistic retry rather than
//! by locks held across I/O.

pub mod record;
pub mod store;

pub use record::{JobRecord, JobView};
pub use store::{JobStore, StoreError};
