use crate::harness::{HarnessReport, SubmissionRecord};
use std::fmt::Write as _;

/// Body text longer than this is cut in the transcript; the JSON report keeps
/// it whole.
const MAX_BODY_CHARS: usize = 500;

pub fn render_transcript(report: &HarnessReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "corpact-verify run started {}", report.started_at);
    let _ = writeln!(out, "  target:   {}", report.target_url);
    let _ = writeln!(out, "  event id: {}", report.event_id);

    match &report.readiness {
        Some(readiness) if readiness.ready => {
            let _ = writeln!(
                out,
                "readiness: ready after {} attempt(s) in {}",
                readiness.attempts,
                format_ms(readiness.elapsed_ms)
            );
        }
        Some(readiness) => {
            let _ = writeln!(
                out,
                "readiness: NOT ready after {} attempt(s) in {}{}",
                readiness.attempts,
                format_ms(readiness.elapsed_ms),
                readiness
                    .last_error
                    .as_deref()
                    .map(|e| format!(" (last error: {e})"))
                    .unwrap_or_default()
            );
        }
        None => {
            let _ = writeln!(out, "readiness: not attempted");
        }
    }

    match &report.submission {
        Some(SubmissionRecord::Responded { status_code, body }) => {
            let _ = writeln!(out, "submission: HTTP {status_code}");
            if !body.is_empty() {
                let _ = writeln!(out, "  body: {}", truncate(body, MAX_BODY_CHARS));
            }
        }
        Some(SubmissionRecord::TransportError { message }) => {
            let _ = writeln!(out, "submission: transport error: {message}");
        }
        None => {
            let _ = writeln!(out, "submission: not attempted");
        }
    }

    match &report.completion {
        Some(completion) => {
            let _ = writeln!(
                out,
                "completion: {} read(s) of {}{}",
                completion.reads,
                completion.record_source,
                if completion.record_seen {
                    ""
                } else {
                    " (record never appeared)"
                }
            );
            for marker in &completion.markers {
                match marker.first_seen_ms {
                    Some(ms) if marker.is_found() => {
                        let _ = writeln!(
                            out,
                            "  [found]   {} (+{})",
                            marker.marker,
                            format_ms(ms)
                        );
                    }
                    _ => {
                        let _ = writeln!(out, "  [MISSING] {}", marker.marker);
                    }
                }
            }
            if completion.order_deviates {
                let _ = writeln!(
                    out,
                    "  note: markers appeared in a different order: {}",
                    completion.observed_order.join(" -> ")
                );
            }
            if !completion.failure_markers_seen.is_empty() {
                let _ = writeln!(out, "  service failure lines in the record (may predate this run):");
                for marker in &completion.failure_markers_seen {
                    let _ = writeln!(out, "  [service] {marker}");
                }
            }
        }
        None => {
            let _ = writeln!(out, "completion: not checked");
            for marker in &report.expected_markers {
                let _ = writeln!(out, "  [MISSING] {marker}");
            }
        }
    }

    let _ = writeln!(out, "transitions:");
    for transition in &report.transitions {
        let _ = writeln!(
            out,
            "  {:>8} {} -> {}: {}",
            format_ms(transition.elapsed_ms),
            transition.from,
            transition.to,
            transition.detail
        );
    }

    let elapsed = format_ms(report.verdict.elapsed.as_millis() as u64);
    match &report.verdict.failure_reason {
        None => {
            let _ = writeln!(out, "verdict: PASSED in {elapsed}");
        }
        Some(reason) => {
            let _ = writeln!(out, "verdict: FAILED ({}) in {elapsed}", reason.code());
            let _ = writeln!(out, "  reason: {reason}");
        }
    }

    out
}

fn format_ms(ms: u64) -> String {
    format!("{:.2}s", ms as f64 / 1000.0)
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let cut: String = value.chars().take(max_chars).collect();
    format!("{cut}...")
}
