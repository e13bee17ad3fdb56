use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSourceError {
    /// Exists but cannot be read (permissions, is a directory, bad encoding).
    Unavailable(String),
}

impl fmt::Display for RecordSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordSourceError::Unavailable(msg) => write!(f, "{msg}"),
        }
    }
}

/// Read-only view of the side-channel event record.
pub trait RecordSource {
    /// Full current content. `Ok(None)` when the record does not exist yet.
    fn read_all(&self) -> Result<Option<String>, RecordSourceError>;

    /// Human-readable location, for transcripts.
    fn describe(&self) -> String;
}
