use crate::value_objects::markers::ExpectedMarkers;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerObservation {
    pub marker: String,
    /// Time since the verifier started, at the read that first contained it.
    pub first_seen_ms: Option<u64>,
    /// Index of that read (0-based).
    pub first_seen_read: Option<u64>,
    /// Byte offset of the first occurrence inside that read.
    #[serde(skip)]
    first_seen_offset: Option<usize>,
}

impl MarkerObservation {
    pub fn is_found(&self) -> bool {
        self.first_seen_read.is_some()
    }
}

/// Accumulates marker sightings across successive reads of the event record.
///
/// A marker once seen stays seen, so a read that races a concurrent write or a
/// rotation that truncates the record cannot un-find it.
#[derive(Debug, Clone)]
pub struct MarkerTracker {
    observations: Vec<MarkerObservation>,
    reads: u64,
}

impl MarkerTracker {
    pub fn new(expected: &ExpectedMarkers) -> Self {
        Self {
            observations: expected
                .iter()
                .map(|marker| MarkerObservation {
                    marker: marker.to_string(),
                    first_seen_ms: None,
                    first_seen_read: None,
                    first_seen_offset: None,
                })
                .collect(),
            reads: 0,
        }
    }

    /// Scans one snapshot of the record. Returns the markers first seen in it.
    pub fn observe(&mut self, content: &str, elapsed: Duration) -> Vec<String> {
        let read_index = self.reads;
        self.reads += 1;

        let mut newly_found = Vec::new();
        for observation in self.observations.iter_mut().filter(|o| !o.is_found()) {
            if let Some(offset) = content.find(observation.marker.as_str()) {
                observation.first_seen_ms = Some(elapsed.as_millis() as u64);
                observation.first_seen_read = Some(read_index);
                observation.first_seen_offset = Some(offset);
                newly_found.push(observation.marker.clone());
            }
        }
        newly_found
    }

    pub fn is_complete(&self) -> bool {
        self.observations.iter().all(MarkerObservation::is_found)
    }

    pub fn observations(&self) -> &[MarkerObservation] {
        &self.observations
    }

    /// Found markers, in expected order.
    pub fn found(&self) -> Vec<String> {
        self.observations
            .iter()
            .filter(|o| o.is_found())
            .map(|o| o.marker.clone())
            .collect()
    }

    /// Missing markers, in expected order.
    pub fn missing(&self) -> Vec<String> {
        self.observations
            .iter()
            .filter(|o| !o.is_found())
            .map(|o| o.marker.clone())
            .collect()
    }

    /// Found markers in the order they showed up: by read, then by position
    /// within that read.
    pub fn observed_order(&self) -> Vec<String> {
        let mut found: Vec<&MarkerObservation> =
            self.observations.iter().filter(|o| o.is_found()).collect();
        found.sort_by_key(|o| (o.first_seen_read, o.first_seen_offset));
        found.into_iter().map(|o| o.marker.clone()).collect()
    }

    /// True when the found markers appeared in a different order than
    /// expected. Informational only.
    pub fn order_deviates(&self) -> bool {
        self.observed_order() != self.found()
    }
}

#[cfg(test)]
mod tests {
    use super::MarkerTracker;
    use crate::value_objects::markers::ExpectedMarkers;
    use std::time::Duration;

    fn markers() -> ExpectedMarkers {
        ExpectedMarkers::new(["received", "published", "processing", "persisted"])
    }

    #[test]
    fn accumulates_across_reads() {
        let mut tracker = MarkerTracker::new(&markers());
        let first = tracker.observe("received\npublished\n", Duration::from_millis(10));
        assert_eq!(first, vec!["received".to_string(), "published".to_string()]);
        assert!(!tracker.is_complete());

        // Rotated record: earlier lines are gone but stay counted.
        let second = tracker.observe("processing\npersisted\n", Duration::from_millis(20));
        assert_eq!(second.len(), 2);
        assert!(tracker.is_complete());
        assert!(tracker.missing().is_empty());
        assert_eq!(tracker.observations()[3].first_seen_read, Some(1));
    }

    #[test]
    fn first_seen_time_is_not_overwritten() {
        let mut tracker = MarkerTracker::new(&markers());
        tracker.observe("received", Duration::from_millis(5));
        tracker.observe("received", Duration::from_millis(500));
        assert_eq!(tracker.observations()[0].first_seen_ms, Some(5));
        assert_eq!(tracker.observations()[0].first_seen_read, Some(0));
    }

    #[test]
    fn order_is_reported_but_not_enforced() {
        let mut tracker = MarkerTracker::new(&markers());
        tracker.observe(
            "persisted processing published received",
            Duration::from_millis(1),
        );
        assert!(tracker.is_complete());
        assert!(tracker.order_deviates());
        assert_eq!(
            tracker.observed_order(),
            vec!["persisted", "processing", "published", "received"]
        );
    }

    #[test]
    fn empty_marker_set_is_complete_immediately() {
        let tracker = MarkerTracker::new(&ExpectedMarkers::new(Vec::<String>::new()));
        assert!(tracker.is_complete());
        assert!(!tracker.order_deviates());
    }
}
