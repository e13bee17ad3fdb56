use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    ServiceUnreachable,
    TransportError { message: String },
    SubmissionRejected { status_code: u16, body: String },
    AsyncCompletionIncomplete { missing_markers: Vec<String> },
    RecordSourceUnavailable { message: String },
    Cancelled,
}

impl FailureReason {
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::ServiceUnreachable => "service_unreachable",
            FailureReason::TransportError { .. } => "transport_error",
            FailureReason::SubmissionRejected { .. } => "submission_rejected",
            FailureReason::AsyncCompletionIncomplete { .. } => "async_completion_incomplete",
            FailureReason::RecordSourceUnavailable { .. } => "record_source_unavailable",
            FailureReason::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ServiceUnreachable => write!(f, "service unreachable"),
            FailureReason::TransportError { message } => write!(f, "transport error: {message}"),
            FailureReason::SubmissionRejected { status_code, body } => {
                write!(f, "submission rejected: expected 202, got {status_code}")?;
                if !body.is_empty() {
                    write!(f, " ({body})")?;
                }
                Ok(())
            }
            FailureReason::AsyncCompletionIncomplete { missing_markers } => write!(
                f,
                "async completion incomplete: {} marker(s) missing",
                missing_markers.len()
            ),
            FailureReason::RecordSourceUnavailable { message } => {
                write!(f, "record source unavailable: {message}")
            }
            FailureReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal result of a verification. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationVerdict {
    pub success: bool,
    pub found_markers: Vec<String>,
    pub missing_markers: Vec<String>,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
    pub failure_reason: Option<FailureReason>,
}

impl VerificationVerdict {
    pub fn passed(found_markers: Vec<String>, elapsed: Duration) -> Self {
        Self {
            success: true,
            found_markers,
            missing_markers: Vec::new(),
            elapsed,
            failure_reason: None,
        }
    }

    pub fn failed(
        reason: FailureReason,
        found_markers: Vec<String>,
        missing_markers: Vec<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            success: false,
            found_markers,
            missing_markers,
            elapsed,
            failure_reason: Some(reason),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.failure_reason, Some(FailureReason::Cancelled))
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
