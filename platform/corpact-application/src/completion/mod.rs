//! Completion verifier.
//!
//! The background worker of the system under test runs on its own schedule,
//! so a single read after a fixed delay either checks too early or hides a
//! failure behind a lucky race. The verifier instead re-reads the whole record
//! at a fixed cadence and accumulates marker sightings until every marker has
//! been seen or the timeout runs out. Marker order is reported, never
//! enforced.
//!
//! Failure markers (error lines the services log when they drop a submission)
//! are collected alongside and surfaced in the report. They do not change the
//! verdict: the record is shared across runs, so a failure line may predate
//! this submission.

use corpact_domain::repositories::control::RunControl;
use corpact_domain::repositories::record_source::RecordSource;
use corpact_domain::services::marker_tracker::{MarkerObservation, MarkerTracker};
use corpact_domain::value_objects::markers::ExpectedMarkers;
use corpact_domain::value_objects::verdict::{FailureReason, VerificationVerdict};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn};

#[derive(Debug, Clone, Copy)]
pub struct CompletionPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionReport {
    pub verdict: VerificationVerdict,
    pub record_source: String,
    pub reads: u64,
    /// Whether any read found the record present.
    pub record_seen: bool,
    pub markers: Vec<MarkerObservation>,
    pub observed_order: Vec<String>,
    pub order_deviates: bool,
    /// Failure markers present in the record, in the order first seen.
    pub failure_markers_seen: Vec<String>,
}

pub fn verify_completion(
    source: &dyn RecordSource,
    expected: &ExpectedMarkers,
    failure_markers: &ExpectedMarkers,
    policy: CompletionPolicy,
    control: &dyn RunControl,
) -> CompletionReport {
    let _span = info_span!(
        "verify_completion",
        record_source = %source.describe(),
        markers = expected.len()
    )
    .entered();

    let start = Instant::now();
    let mut tracker = MarkerTracker::new(expected);
    let mut failures = MarkerTracker::new(failure_markers);
    let mut record_seen = false;
    let mut reads = 0u64;

    loop {
        if control.should_cancel() {
            return conclude(
                source,
                &tracker,
                &failures,
                reads,
                record_seen,
                start,
                Some(FailureReason::Cancelled),
            );
        }

        match source.read_all() {
            Ok(Some(content)) => {
                reads += 1;
                record_seen = true;
                for marker in tracker.observe(&content, start.elapsed()) {
                    info!(
                        marker = %marker,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "marker observed"
                    );
                }
                for marker in failures.observe(&content, start.elapsed()) {
                    warn!(marker = %marker, "service failure line present in record");
                }
            }
            Ok(None) => {
                reads += 1;
                debug!(read = reads, "record source not created yet");
            }
            Err(err) => {
                warn!(error = %err, "record source unreadable");
                let reason = FailureReason::RecordSourceUnavailable {
                    message: err.to_string(),
                };
                return conclude(
                source,
                &tracker,
                &failures,
                reads,
                record_seen,
                start,
                Some(reason),
            );
            }
        }
        metrics::counter!("corpact.completion.reads_total").increment(1);

        if tracker.is_complete() {
            return conclude(source, &tracker, &failures, reads, record_seen, start, None);
        }

        let elapsed = start.elapsed();
        if elapsed >= policy.timeout {
            let reason = FailureReason::AsyncCompletionIncomplete {
                missing_markers: tracker.missing(),
            };
            return conclude(
                source,
                &tracker,
                &failures,
                reads,
                record_seen,
                start,
                Some(reason),
            );
        }

        let remaining = policy.timeout - elapsed;
        if !control.sleep(policy.poll_interval.min(remaining)) {
            return conclude(
                source,
                &tracker,
                &failures,
                reads,
                record_seen,
                start,
                Some(FailureReason::Cancelled),
            );
        }
    }
}

fn conclude(
    source: &dyn RecordSource,
    tracker: &MarkerTracker,
    failures: &MarkerTracker,
    reads: u64,
    record_seen: bool,
    start: Instant,
    failure: Option<FailureReason>,
) -> CompletionReport {
    let elapsed = start.elapsed();
    let verdict = match failure {
        None => VerificationVerdict::passed(tracker.found(), elapsed),
        Some(reason) => {
            VerificationVerdict::failed(reason, tracker.found(), tracker.missing(), elapsed)
        }
    };

    metrics::histogram!(
        "corpact.completion.elapsed_ms",
        "result" => if verdict.success { "passed" } else { "failed" }
    )
    .record(elapsed.as_millis() as f64);

    if tracker.order_deviates() {
        info!(observed = ?tracker.observed_order(), "markers appeared out of expected order");
    }
    info!(
        success = verdict.success,
        reads,
        found = verdict.found_markers.len(),
        missing = verdict.missing_markers.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "completion check finished"
    );

    CompletionReport {
        verdict,
        record_source: source.describe(),
        reads,
        record_seen,
        markers: tracker.observations().to_vec(),
        observed_order: tracker.observed_order(),
        order_deviates: tracker.order_deviates(),
        failure_markers_seen: failures.observed_order(),
    }
}
