use crate::value_objects::acceptance::AcceptanceResponse;
use crate::value_objects::endpoint::Endpoint;
use crate::value_objects::payload::SubmissionDocument;
use std::fmt;

/// The exchange could not complete. A non-202 answer is not a transport error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    Connect(String),
    Timeout(String),
    Encode(String),
    Io(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Connect(msg) => write!(f, "connect failed: {msg}"),
            TransportError::Timeout(msg) => write!(f, "timed out: {msg}"),
            TransportError::Encode(msg) => write!(f, "encode failed: {msg}"),
            TransportError::Io(msg) => write!(f, "exchange failed: {msg}"),
        }
    }
}

/// Sends exactly one submission. Implementations must not retry.
pub trait SubmissionGateway {
    fn submit(
        &self,
        endpoint: &Endpoint,
        path: &str,
        document: &SubmissionDocument,
    ) -> Result<AcceptanceResponse, TransportError>;
}
