use serde::{Deserialize, Serialize};

/// Required lifecycle markers, in the order the system under test is expected
/// to emit them. The order is only used for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedMarkers(Vec<String>);

impl ExpectedMarkers {
    /// Drops duplicates, keeping the first occurrence.
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for marker in markers {
            let marker = marker.into();
            if !out.contains(&marker) {
                out.push(marker);
            }
        }
        Self(out)
    }

    /// Markers logged by the DMZ service, the event bus and the internal
    /// service for one corporate-action submission.
    pub fn default_for_event(event_id: &str) -> Self {
        Self::new([
            "DMZ Service: Received submission".to_string(),
            "[EventBus] Published event".to_string(),
            "Internal Service: Processing event".to_string(),
            format!("Internal Service: Successfully saved ENCRYPTED Corporate Action {event_id}"),
        ])
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
