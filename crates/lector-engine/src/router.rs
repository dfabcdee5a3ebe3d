//! Pure routing: which step follows the one that just finished.
//!
//! The router never mutates the record. The supervisor's retry gate uses
//! [`retry_eligible`] as well, so the two cannot disagree about whether a
//! loop back to execution counts as a retry.

use lector_state::{Approval, RunState, Step};

/// Whether the step that just finished asked for the translation to be redone.
pub fn retry_requested(finished: Step, state: &RunState) -> bool {
  match finished {
    Step::Qa => state.qa_failed(),
    Step::Judge => state.judge_requested_retry(),
    _ => false,
  }
}

/// Whether a retry was requested and the retry budget still allows one.
pub fn retry_eligible(finished: Step, state: &RunState) -> bool {
  retry_requested(finished, state) && state.retry_count < state.max_retries
}

/// Decide the next step after `current` completed.
pub fn next_step(current: Step, state: &RunState) -> Step {
  match current {
    Step::Intake => Step::Planner,
    Step::Planner => {
      if state.approval_requested() && state.approval_granted == Approval::Unset {
        Step::PauseForApproval
      } else {
        Step::Execution
      }
    }
    Step::Execution => Step::Qa,
    Step::Qa if retry_eligible(Step::Qa, state) => Step::Execution,
    Step::Qa => Step::Judge,
    Step::Judge if retry_eligible(Step::Judge, state) => Step::Execution,
    Step::Judge => Step::Delivery,
    Step::Delivery | Step::PauseForApproval | Step::End => Step::End,
  }
}
