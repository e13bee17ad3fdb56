use corpact_domain::repositories::record_source::{RecordSource, RecordSourceError};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared in-process event record. Clones see the same content, so one clone
/// can be handed to a writer thread while the verifier reads another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordSource {
    content: Arc<Mutex<Option<String>>>,
}

impl InMemoryRecordSource {
    /// Starts absent, like a log file that has not been created yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(content: impl Into<String>) -> Self {
        let source = Self::new();
        source.replace(content);
        source
    }

    pub fn append_line(&self, line: &str) {
        let mut guard = self.content.lock();
        let content = guard.get_or_insert_with(String::new);
        content.push_str(line);
        content.push('\n');
    }

    /// Simulates rotation or truncation.
    pub fn replace(&self, content: impl Into<String>) {
        *self.content.lock() = Some(content.into());
    }

    pub fn remove(&self) {
        *self.content.lock() = None;
    }
}

impl RecordSource for InMemoryRecordSource {
    fn read_all(&self) -> Result<Option<String>, RecordSourceError> {
        Ok(self.content.lock().clone())
    }

    fn describe(&self) -> String {
        "in-memory record".to_string()
    }
}
