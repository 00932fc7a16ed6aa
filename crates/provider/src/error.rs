//! Errors from the provider API layer.

/// Errors that can occur when talking to the generation provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for diagnostics.
        body: String,
    },
}

impl ProviderError {
    /// Whether this error is a provider-side rejection of the request
    /// (4xx). Rejections are terminal: retrying the same request cannot
    /// succeed.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ProviderError::Api { status, .. } if (400..500).contains(status))
    }

    /// Whether this error is transient (transport failure or 5xx) and
    /// worth retrying on the next poll interval.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Request(_) => true,
            ProviderError::Api { status, .. } => *status >= 500,
        }
    }

    /// Human-readable message suitable for error classification. For API
    /// errors this is the raw body the provider sent.
    pub fn message(&self) -> String {
        match self {
            ProviderError::Request(e) => e.to_string(),
            ProviderError::Api { body, .. } => body.clone(),
        }
    }
}
