use crate::completion::{verify_completion, CompletionPolicy, CompletionReport};
use crate::config::{Config, HarnessTimings};
use crate::readiness::{wait_for_ready, ReadinessOutcome, ReadinessPolicy};
use crate::submission;
use corpact_domain::repositories::connection::ConnectionProbe;
use corpact_domain::repositories::control::RunControl;
use corpact_domain::repositories::record_source::RecordSource;
use corpact_domain::repositories::submission::SubmissionGateway;
use corpact_domain::value_objects::endpoint::Endpoint;
use corpact_domain::value_objects::markers::ExpectedMarkers;
use corpact_domain::value_objects::payload::SubmissionDocument;
use corpact_domain::value_objects::phase::RunPhase;
use corpact_domain::value_objects::verdict::{FailureReason, VerificationVerdict};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn};

pub struct HarnessDeps<'a> {
    pub probe: &'a dyn ConnectionProbe,
    pub gateway: &'a dyn SubmissionGateway,
    pub record_source: &'a dyn RecordSource,
    pub control: &'a dyn RunControl,
}

/// Everything one run needs, resolved up front.
#[derive(Debug, Clone)]
pub struct HarnessPlan {
    pub endpoint: Endpoint,
    pub submission_path: String,
    pub payload: SubmissionDocument,
    pub expected_markers: ExpectedMarkers,
    pub failure_markers: ExpectedMarkers,
    pub timings: HarnessTimings,
}

impl HarnessPlan {
    pub fn from_config(config: &Config, payload: SubmissionDocument) -> Self {
        let expected_markers = config.expected_markers(payload.event_id());
        Self {
            endpoint: config.endpoint(),
            submission_path: config.target.submission_path.clone(),
            payload,
            expected_markers,
            failure_markers: config.failure_markers(),
            timings: config.timings(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseTransition {
    pub from: RunPhase,
    pub to: RunPhase,
    pub elapsed_ms: u64,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionRecord {
    Responded { status_code: u16, body: String },
    TransportError { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct HarnessReport {
    pub started_at: String,
    pub target_url: String,
    pub event_id: String,
    pub expected_markers: Vec<String>,
    pub readiness: Option<ReadinessOutcome>,
    pub submission: Option<SubmissionRecord>,
    pub completion: Option<CompletionReport>,
    pub transitions: Vec<PhaseTransition>,
    pub phase: RunPhase,
    pub verdict: VerificationVerdict,
}

impl HarnessReport {
    pub fn passed(&self) -> bool {
        self.phase == RunPhase::Passed
    }
}

struct RunState {
    phase: RunPhase,
    start: Instant,
    transitions: Vec<PhaseTransition>,
}

impl RunState {
    fn new() -> Self {
        Self {
            phase: RunPhase::NotStarted,
            start: Instant::now(),
            transitions: Vec::new(),
        }
    }

    fn transition(&mut self, to: RunPhase, detail: impl Into<String>) {
        debug_assert!(
            self.phase.can_transition_to(to),
            "illegal transition {} -> {}",
            self.phase,
            to
        );
        let detail = detail.into();
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        info!(
            from = %self.phase,
            to = %to,
            elapsed_ms,
            detail = %detail,
            "phase transition"
        );
        self.transitions.push(PhaseTransition {
            from: self.phase,
            to,
            elapsed_ms,
            detail,
        });
        self.phase = to;
    }

    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Runs readiness, submission and completion in order and folds every
/// outcome into a report. Never returns an error: each failure becomes a
/// `Failed` verdict with a reason.
pub fn run_harness(plan: &HarnessPlan, deps: &HarnessDeps<'_>) -> HarnessReport {
    let target_url = plan.endpoint.http_url(&plan.submission_path);
    let _span = info_span!(
        "harness",
        target = %target_url,
        event_id = %plan.payload.event_id()
    )
    .entered();

    let mut report = HarnessReport {
        started_at: chrono::Utc::now().to_rfc3339(),
        target_url,
        event_id: plan.payload.event_id().to_string(),
        expected_markers: plan.expected_markers.as_slice().to_vec(),
        readiness: None,
        submission: None,
        completion: None,
        transitions: Vec::new(),
        phase: RunPhase::NotStarted,
        verdict: VerificationVerdict::failed(
            FailureReason::Cancelled,
            Vec::new(),
            plan.expected_markers.as_slice().to_vec(),
            Duration::ZERO,
        ),
    };
    let mut state = RunState::new();

    for issue in plan.payload.preflight() {
        warn!(issue = %issue, "payload does not satisfy the service schema");
    }

    state.transition(
        RunPhase::WaitingForReadiness,
        format!(
            "probing {} (timeout {}ms)",
            plan.endpoint,
            plan.timings.readiness_timeout.as_millis()
        ),
    );
    let readiness = wait_for_ready(
        deps.probe,
        &plan.endpoint,
        ReadinessPolicy {
            timeout: plan.timings.readiness_timeout,
            poll_interval: plan.timings.readiness_poll_interval,
            connect_timeout: plan.timings.connect_timeout,
        },
        deps.control,
    );
    let ready = readiness.ready;
    let readiness_detail = format!(
        "{} attempt(s) over {}ms, last error: {}",
        readiness.attempts,
        readiness.elapsed_ms,
        readiness.last_error.as_deref().unwrap_or("none")
    );
    let readiness_cancelled = readiness.cancelled;
    report.readiness = Some(readiness);
    if readiness_cancelled {
        return fail(report, state, FailureReason::Cancelled, readiness_detail);
    }
    if !ready {
        return fail(report, state, FailureReason::ServiceUnreachable, readiness_detail);
    }

    state.transition(
        RunPhase::Submitting,
        format!("ready after {readiness_detail}"),
    );
    if deps.control.should_cancel() {
        return fail(report, state, FailureReason::Cancelled, "cancelled before submission");
    }
    match submission::submit(deps.gateway, &plan.endpoint, &plan.submission_path, &plan.payload) {
        Err(err) => {
            let message = err.to_string();
            report.submission = Some(SubmissionRecord::TransportError {
                message: message.clone(),
            });
            return fail(
                report,
                state,
                FailureReason::TransportError {
                    message: message.clone(),
                },
                message,
            );
        }
        Ok(response) => {
            report.submission = Some(SubmissionRecord::Responded {
                status_code: response.status_code,
                body: response.body.clone(),
            });
            if !response.is_accepted() {
                let detail = format!("status {}", response.status_code);
                return fail(
                    report,
                    state,
                    FailureReason::SubmissionRejected {
                        status_code: response.status_code,
                        body: response.body,
                    },
                    detail,
                );
            }
        }
    }

    state.transition(
        RunPhase::WaitingForCompletion,
        format!(
            "accepted; watching {} for {} marker(s)",
            deps.record_source.describe(),
            plan.expected_markers.len()
        ),
    );
    if !plan.timings.post_delay_before_verify.is_zero()
        && !deps.control.sleep(plan.timings.post_delay_before_verify)
    {
        return fail(report, state, FailureReason::Cancelled, "cancelled during post delay");
    }

    let completion = verify_completion(
        deps.record_source,
        &plan.expected_markers,
        &plan.failure_markers,
        CompletionPolicy {
            timeout: plan.timings.completion_timeout,
            poll_interval: plan.timings.completion_poll_interval,
        },
        deps.control,
    );
    let found = completion.verdict.found_markers.clone();
    let missing = completion.verdict.missing_markers.clone();
    let detail = format!(
        "{} read(s), {} of {} marker(s) found",
        completion.reads,
        found.len(),
        plan.expected_markers.len()
    );
    let failure = completion.verdict.failure_reason.clone();
    report.completion = Some(completion);

    match failure {
        None => {
            state.transition(RunPhase::Passed, detail);
            report.verdict = VerificationVerdict::passed(found, state.elapsed());
            finalize(report, state)
        }
        Some(reason) => {
            state.transition(RunPhase::Failed, format!("{reason}; {detail}"));
            report.verdict = VerificationVerdict::failed(reason, found, missing, state.elapsed());
            finalize(report, state)
        }
    }
}

fn fail(
    mut report: HarnessReport,
    mut state: RunState,
    reason: FailureReason,
    detail: impl Into<String>,
) -> HarnessReport {
    state.transition(RunPhase::Failed, format!("{reason}; {}", detail.into()));
    report.verdict = VerificationVerdict::failed(
        reason,
        Vec::new(),
        report.expected_markers.clone(),
        state.elapsed(),
    );
    finalize(report, state)
}

fn finalize(mut report: HarnessReport, state: RunState) -> HarnessReport {
    debug_assert!(state.phase.is_terminal(), "run ended in {}", state.phase);
    let label = if report.verdict.success { "passed" } else { "failed" };
    metrics::counter!("corpact.harness.runs_total", "result" => label).increment(1);
    info!(
        verdict = label,
        reason = report
            .verdict
            .failure_reason
            .as_ref()
            .map(FailureReason::code)
            .unwrap_or("none"),
        elapsed_ms = report.verdict.elapsed.as_millis() as u64,
        "harness run finished"
    );
    report.phase = state.phase;
    report.transitions = state.transitions;
    report
}
