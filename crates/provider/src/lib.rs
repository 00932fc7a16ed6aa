//! Provider Adapter boundary for the external video generation API.
//!
//! Heterogeneous provider payloads are normalized here into the closed
//! [`status::ProviderState`] set before anything touches job state; the
//! orchestration engine never branches on vendor field names. The
//! [`adapter::ProviderAdapter`] trait is the seam the engine depends on,
//! with [`http::VideoGenClient`] as the production implementation.

pub mod adapter;
pub mod error;
pub mod http;
pub mod status;

pub use adapter::{ProviderAdapter, Submission};
pub use error::ProviderError;
pub use http::VideoGenClient;
pub use status::{ProviderJobStatus, ProviderState};
