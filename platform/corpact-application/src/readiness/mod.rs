use corpact_domain::repositories::connection::ConnectionProbe;
use corpact_domain::repositories::control::RunControl;
use corpact_domain::value_objects::endpoint::Endpoint;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span};

#[derive(Debug, Clone, Copy)]
pub struct ReadinessPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadinessOutcome {
    pub ready: bool,
    pub cancelled: bool,
    pub attempts: u32,
    pub elapsed_ms: u64,
    pub last_error: Option<String>,
}

/// Polls `endpoint` until a connection is accepted or `policy.timeout` has
/// elapsed. Always makes at least one attempt, even with a zero timeout, and
/// never gives up before the timeout has passed.
pub fn wait_for_ready(
    probe: &dyn ConnectionProbe,
    endpoint: &Endpoint,
    policy: ReadinessPolicy,
    control: &dyn RunControl,
) -> ReadinessOutcome {
    let _span = info_span!("readiness", endpoint = %endpoint).entered();
    let start = Instant::now();
    let mut attempts = 0u32;
    let mut last_error: Option<String> = None;

    loop {
        if control.should_cancel() {
            return finish(false, true, attempts, start, last_error);
        }

        attempts += 1;
        metrics::counter!("corpact.readiness.attempts_total").increment(1);
        match probe.probe(endpoint, policy.connect_timeout) {
            Ok(()) => {
                info!(
                    attempts,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "endpoint accepting connections"
                );
                return finish(true, false, attempts, start, None);
            }
            Err(err) => {
                debug!(attempt = attempts, error = %err, "endpoint not ready yet");
                last_error = Some(err);
            }
        }

        let elapsed = start.elapsed();
        if elapsed >= policy.timeout {
            info!(
                attempts,
                elapsed_ms = elapsed.as_millis() as u64,
                last_error = last_error.as_deref().unwrap_or(""),
                "endpoint never became ready"
            );
            return finish(false, false, attempts, start, last_error);
        }

        let remaining = policy.timeout - elapsed;
        if !control.sleep(policy.poll_interval.min(remaining)) {
            return finish(false, true, attempts, start, last_error);
        }
    }
}

fn finish(
    ready: bool,
    cancelled: bool,
    attempts: u32,
    start: Instant,
    last_error: Option<String>,
) -> ReadinessOutcome {
    let elapsed_ms = start.elapsed().as_millis() as u64;
    metrics::histogram!("corpact.readiness.elapsed_ms", "ready" => if ready { "true" } else { "false" })
        .record(elapsed_ms as f64);
    ReadinessOutcome {
        ready,
        cancelled,
        attempts,
        elapsed_ms,
        last_error,
    }
}

#[cfg(test)]
mod tests {
    use super::{wait_for_ready, ReadinessPolicy};
    use corpact_domain::repositories::connection::ConnectionProbe;
    use corpact_domain::repositories::control::{RunControl, Uncancellable};
    use corpact_domain::value_objects::endpoint::Endpoint;
    use std::cell::Cell;
    use std::time::{Duration, Instant};

    struct ScriptedProbe {
        succeed_on: Option<u32>,
        calls: Cell<u32>,
    }

    impl ConnectionProbe for ScriptedProbe {
        fn probe(&self, _endpoint: &Endpoint, _connect_timeout: Duration) -> Result<(), String> {
            let call = self.calls.get() + 1;
            self.calls.set(call);
            match self.succeed_on {
                Some(n) if call >= n => Ok(()),
                _ => Err("connection refused".to_string()),
            }
        }
    }

    struct CancelAfterSleeps(Cell<u32>);

    impl RunControl for CancelAfterSleeps {
        fn should_cancel(&self) -> bool {
            self.0.get() == 0
        }

        fn sleep(&self, _duration: Duration) -> bool {
            let left = self.0.get().saturating_sub(1);
            self.0.set(left);
            left > 0
        }
    }

    fn policy(timeout_ms: u64, poll_ms: u64) -> ReadinessPolicy {
        ReadinessPolicy {
            timeout: Duration::from_millis(timeout_ms),
            poll_interval: Duration::from_millis(poll_ms),
            connect_timeout: Duration::from_millis(50),
        }
    }

    #[test]
    fn zero_timeout_still_attempts_once() {
        let probe = ScriptedProbe {
            succeed_on: None,
            calls: Cell::new(0),
        };
        let outcome = wait_for_ready(
            &probe,
            &Endpoint::new("localhost", 1),
            policy(0, 10),
            &Uncancellable,
        );
        assert!(!outcome.ready);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(probe.calls.get(), 1);
        assert_eq!(outcome.last_error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn retries_until_probe_succeeds() {
        let probe = ScriptedProbe {
            succeed_on: Some(3),
            calls: Cell::new(0),
        };
        let outcome = wait_for_ready(
            &probe,
            &Endpoint::new("localhost", 1),
            policy(5_000, 5),
            &Uncancellable,
        );
        assert!(outcome.ready);
        assert_eq!(outcome.attempts, 3);
        assert!(outcome.last_error.is_none());
    }

    #[test]
    fn unreachable_waits_at_least_the_timeout() {
        let probe = ScriptedProbe {
            succeed_on: None,
            calls: Cell::new(0),
        };
        let start = Instant::now();
        let outcome = wait_for_ready(
            &probe,
            &Endpoint::new("localhost", 1),
            policy(120, 50),
            &Uncancellable,
        );
        assert!(!outcome.ready);
        assert!(start.elapsed() >= Duration::from_millis(120));
        assert!(outcome.attempts >= 2);
    }

    #[test]
    fn cancellation_stops_polling() {
        let probe = ScriptedProbe {
            succeed_on: None,
            calls: Cell::new(0),
        };
        let outcome = wait_for_ready(
            &probe,
            &Endpoint::new("localhost", 1),
            policy(60_000, 1_000),
            &CancelAfterSleeps(Cell::new(2)),
        );
        assert!(!outcome.ready);
        assert!(outcome.cancelled);
        assert_eq!(outcome.attempts, 2);
    }
}
