//! Normalized generation request and its structural validation.
//!
//! Validation covers only structural constraints (prompt bounds, size
//! enum, duration bounds, remix-vs-reference exclusivity). Whether a
//! remix parent is actually ready is checked by the dispatcher against
//! live job state.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::JobId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Frame sizes the provider accepts.
pub const VALID_SIZES: &[&str] = &["1280x720", "720x1280", "1024x1024"];

/// Default frame size when the caller does not specify one.
pub const DEFAULT_SIZE: &str = "1280x720";

/// Default model identifier passed through to the provider.
pub const DEFAULT_MODEL: &str = "standard";

/// Default clip length in seconds.
pub const DEFAULT_DURATION_SECS: u32 = 4;

/// Shortest clip the provider will render.
pub const MIN_DURATION_SECS: u32 = 1;

/// Longest clip the provider will render.
pub const MAX_DURATION_SECS: u32 = 60;

/// Upper bound on prompt length in characters.
pub const MAX_PROMPT_LEN: usize = 2000;

// ---------------------------------------------------------------------------
// GenerationRequest
// ---------------------------------------------------------------------------

/// A normalized video generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Text prompt driving the generation.
    pub prompt: String,
    /// Provider model identifier (passed through verbatim).
    pub model: String,
    /// Frame size, one of [`VALID_SIZES`].
    pub size: String,
    /// Clip length in seconds.
    pub duration_secs: u32,
    /// Optional reference image for image-conditioned generation.
    pub reference_image_url: Option<String>,
    /// Set when this request remixes a prior completed job's output.
    pub parent_job_id: Option<JobId>,
}

impl GenerationRequest {
    /// Validate structural constraints.
    ///
    /// Rules:
    /// - Prompt must be non-empty and at most [`MAX_PROMPT_LEN`] characters.
    /// - Model must be non-empty.
    /// - Size must be one of [`VALID_SIZES`].
    /// - Duration must be within `[MIN_DURATION_SECS, MAX_DURATION_SECS]`.
    /// - A remix request must not also carry a reference image (the parent
    ///   job's output is the source material).
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.prompt.trim().is_empty() {
            return Err(CoreError::Validation("Prompt must not be empty".to_string()));
        }
        if self.prompt.chars().count() > MAX_PROMPT_LEN {
            return Err(CoreError::Validation(format!(
                "Prompt must not exceed {MAX_PROMPT_LEN} characters"
            )));
        }
        if self.model.is_empty() {
            return Err(CoreError::Validation("Model must not be empty".to_string()));
        }
        if !VALID_SIZES.contains(&self.size.as_str()) {
            return Err(CoreError::Validation(format!(
                "Invalid size '{}'. Must be one of: {}",
                self.size,
                VALID_SIZES.join(", ")
            )));
        }
        if self.duration_secs < MIN_DURATION_SECS || self.duration_secs > MAX_DURATION_SECS {
            return Err(CoreError::Validation(format!(
                "Duration must be between {MIN_DURATION_SECS} and {MAX_DURATION_SECS} seconds"
            )));
        }
        if self.parent_job_id.is_some() && self.reference_image_url.is_some() {
            return Err(CoreError::Validation(
                "A remix request cannot also carry a reference image".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> GenerationRequest {
        GenerationRequest {
            prompt: "a red fox running through snow".to_string(),
            model: DEFAULT_MODEL.to_string(),
            size: DEFAULT_SIZE.to_string(),
            duration_secs: DEFAULT_DURATION_SECS,
            reference_image_url: None,
            parent_job_id: None,
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn empty_prompt_rejected() {
        let mut req = valid_request();
        req.prompt = "   ".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn oversized_prompt_rejected() {
        let mut req = valid_request();
        req.prompt = "x".repeat(MAX_PROMPT_LEN + 1);
        assert!(req.validate().is_err());
    }

    #[test]
    fn prompt_at_limit_passes() {
        let mut req = valid_request();
        req.prompt = "x".repeat(MAX_PROMPT_LEN);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn unknown_size_rejected() {
        let mut req = valid_request();
        req.size = "640x480".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn all_listed_sizes_pass() {
        for size in VALID_SIZES {
            let mut req = valid_request();
            req.size = size.to_string();
            assert!(req.validate().is_ok(), "size {size} should be valid");
        }
    }

    #[test]
    fn duration_bounds_enforced() {
        let mut req = valid_request();
        req.duration_secs = 0;
        assert!(req.validate().is_err());
        req.duration_secs = MAX_DURATION_SECS + 1;
        assert!(req.validate().is_err());
        req.duration_secs = MAX_DURATION_SECS;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn remix_with_reference_image_rejected() {
        let mut req = valid_request();
        req.parent_job_id = Some(uuid::Uuid::new_v4());
        req.reference_image_url = Some("https://example.com/ref.png".to_string());
        assert!(req.validate().is_err());
    }

    #[test]
    fn remix_without_reference_image_passes() {
        let mut req = valid_request();
        req.parent_job_id = Some(uuid::Uuid::new_v4());
        assert!(req.validate().is_ok());
    }
}
