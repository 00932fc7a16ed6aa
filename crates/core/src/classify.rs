//! Classified job errors and provider failure-message classification.
//!
//! Provider error strings are free-form; [`classify_failure`] maps them
//! into a small closed set of classes for caller-facing reporting. The
//! raw message is always preserved as diagnostic payload.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FailureClass
// ---------------------------------------------------------------------------

/// Classification of a provider-supplied failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// The prompt or reference material violated the provider's content policy.
    ContentPolicy,
    /// Account quota, credit, or rate limit exhausted.
    QuotaExceeded,
    /// The provider considered the request malformed or unsupported.
    MalformedInput,
    /// The provider failed internally.
    ProviderInternal,
    /// Nothing recognizable in the message.
    Unknown,
}

impl FailureClass {
    /// String representation used in API responses and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureClass::ContentPolicy => "content_policy",
            FailureClass::QuotaExceeded => "quota_exceeded",
            FailureClass::MalformedInput => "malformed_input",
            FailureClass::ProviderInternal => "provider_internal",
            FailureClass::Unknown => "unknown",
        }
    }
}

/// Classify a raw provider failure message.
///
/// Keyword matching over the lowercased message. Checked in order of
/// specificity: content policy, quota, malformed input, provider
/// internal. Falls back to [`FailureClass::Unknown`].
pub fn classify_failure(message: &str) -> FailureClass {
    let msg = message.to_ascii_lowercase();

    const CONTENT_POLICY: &[&str] = &["content policy", "moderation", "safety", "policy violation"];
    const QUOTA: &[&str] = &["quota", "rate limit", "too many requests", "insufficient credit", "billing"];
    const MALFORMED: &[&str] = &["invalid", "malformed", "unsupported", "missing required"];
    const INTERNAL: &[&str] = &["internal", "server error", "service unavailable", "bad gateway"];

    let contains_any = |needles: &[&str]| needles.iter().any(|n| msg.contains(n));

    if contains_any(CONTENT_POLICY) {
        FailureClass::ContentPolicy
    } else if contains_any(QUOTA) {
        FailureClass::QuotaExceeded
    } else if contains_any(MALFORMED) {
        FailureClass::MalformedInput
    } else if contains_any(INTERNAL) {
        FailureClass::ProviderInternal
    } else {
        FailureClass::Unknown
    }
}

// ---------------------------------------------------------------------------
// JobError
// ---------------------------------------------------------------------------

/// How a job came to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobErrorKind {
    /// The provider refused the job at submission time.
    SubmissionRejected,
    /// The provider accepted the job but generation failed.
    GenerationFailed,
    /// The provider could not be reached for this job past the retry cap.
    ProviderUnreachable,
    /// No terminal signal arrived within the maximum job age.
    Timeout,
}

impl JobErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobErrorKind::SubmissionRejected => "submission_rejected",
            JobErrorKind::GenerationFailed => "generation_failed",
            JobErrorKind::ProviderUnreachable => "provider_unreachable",
            JobErrorKind::Timeout => "timeout",
        }
    }
}

/// Classified error recorded on a failed or expired job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    /// How the job failed.
    pub kind: JobErrorKind,
    /// Classification of the provider message, where one exists.
    pub class: Option<FailureClass>,
    /// Raw provider message, kept as diagnostic payload only.
    pub message: String,
}

impl JobError {
    /// Submission-time provider rejection, with the reason classified.
    pub fn submission_rejected(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: JobErrorKind::SubmissionRejected,
            class: Some(classify_failure(&message)),
            message,
        }
    }

    /// Post-submission generation failure, with the reason classified.
    pub fn generation_failed(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: JobErrorKind::GenerationFailed,
            class: Some(classify_failure(&message)),
            message,
        }
    }

    /// Repeated poll failures exhausted the retry cap.
    pub fn provider_unreachable(message: impl Into<String>) -> Self {
        Self {
            kind: JobErrorKind::ProviderUnreachable,
            class: None,
            message: message.into(),
        }
    }

    /// The poller expired the job after the maximum age.
    pub fn timeout() -> Self {
        Self {
            kind: JobErrorKind::Timeout,
            class: None,
            message: "No terminal status within the maximum job age".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- classify_failure --

    #[test]
    fn classifies_content_policy() {
        assert_eq!(
            classify_failure("Request rejected: content policy violation"),
            FailureClass::ContentPolicy
        );
        assert_eq!(
            classify_failure("Flagged by moderation system"),
            FailureClass::ContentPolicy
        );
    }

    #[test]
    fn classifies_quota() {
        assert_eq!(
            classify_failure("Monthly quota exceeded"),
            FailureClass::QuotaExceeded
        );
        assert_eq!(
            classify_failure("429 Too Many Requests"),
            FailureClass::QuotaExceeded
        );
    }

    #[test]
    fn classifies_malformed_input() {
        assert_eq!(
            classify_failure("Invalid value for 'size'"),
            FailureClass::MalformedInput
        );
        assert_eq!(
            classify_failure("Unsupported reference image format"),
            FailureClass::MalformedInput
        );
    }

    #[test]
    fn classifies_provider_internal() {
        assert_eq!(
            classify_failure("Internal server error"),
            FailureClass::ProviderInternal
        );
    }

    #[test]
    fn unrecognized_message_is_unknown() {
        assert_eq!(classify_failure("something odd happened"), FailureClass::Unknown);
        assert_eq!(classify_failure(""), FailureClass::Unknown);
    }

    #[test]
    fn content_policy_wins_over_malformed() {
        // "invalid" also appears, but the policy wording is more specific.
        assert_eq!(
            classify_failure("Invalid prompt: content policy violation"),
            FailureClass::ContentPolicy
        );
    }

    // -- JobError constructors --

    #[test]
    fn submission_rejection_carries_classification() {
        let err = JobError::submission_rejected("Blocked by content policy");
        assert_eq!(err.kind, JobErrorKind::SubmissionRejected);
        assert_eq!(err.class, Some(FailureClass::ContentPolicy));
        assert_eq!(err.message, "Blocked by content policy");
    }

    #[test]
    fn timeout_has_no_classification() {
        let err = JobError::timeout();
        assert_eq!(err.kind, JobErrorKind::Timeout);
        assert_eq!(err.class, None);
    }

    #[test]
    fn job_error_serializes_snake_case() {
        let err = JobError::generation_failed("quota exceeded");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "generation_failed");
        assert_eq!(json["class"], "quota_exceeded");
    }
}
