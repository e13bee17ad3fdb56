use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    NotStarted,
    WaitingForReadiness,
    Submitting,
    WaitingForCompletion,
    Passed,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::Passed | RunPhase::Failed)
    }

    /// Legal edges of the run state machine.
    pub fn can_transition_to(self, next: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (self, next),
            (NotStarted, WaitingForReadiness)
                | (WaitingForReadiness, Submitting)
                | (WaitingForReadiness, Failed)
                | (Submitting, WaitingForCompletion)
                | (Submitting, Failed)
                | (WaitingForCompletion, Passed)
                | (WaitingForCompletion, Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunPhase::NotStarted => "not_started",
            RunPhase::WaitingForReadiness => "waiting_for_readiness",
            RunPhase::Submitting => "submitting",
            RunPhase::WaitingForCompletion => "waiting_for_completion",
            RunPhase::Passed => "passed",
            RunPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::RunPhase;

    #[test]
    fn terminal_phases_have_no_exits() {
        let all = [
            RunPhase::NotStarted,
            RunPhase::WaitingForReadiness,
            RunPhase::Submitting,
            RunPhase::WaitingForCompletion,
            RunPhase::Passed,
            RunPhase::Failed,
        ];
        for from in [RunPhase::Passed, RunPhase::Failed] {
            assert!(from.is_terminal());
            assert!(all.iter().all(|to| !from.can_transition_to(*to)));
        }
    }

    #[test]
    fn cannot_skip_submission() {
        assert!(!RunPhase::WaitingForReadiness.can_transition_to(RunPhase::WaitingForCompletion));
        assert!(!RunPhase::NotStarted.can_transition_to(RunPhase::Failed));
    }
}
