use std::fmt;

use serde::{Deserialize, Serialize};

/// A node of the fixed translation pipeline.
///
/// `PauseForApproval` and `End` are control points with no worker behind
/// them; the supervisor handles them itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
  Intake,
  Planner,
  Execution,
  Qa,
  Judge,
  Delivery,
  PauseForApproval,
  End,
}

impl Step {
  /// Steps backed by a worker, in pipeline order.
  pub const WORKERS: [Step; 6] = [
    Step::Intake,
    Step::Planner,
    Step::Execution,
    Step::Qa,
    Step::Judge,
    Step::Delivery,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Step::Intake => "intake",
      Step::Planner => "planner",
      Step::Execution => "execution",
      Step::Qa => "qa",
      Step::Judge => "judge",
      Step::Delivery => "delivery",
      Step::PauseForApproval => "pause_for_approval",
      Step::End => "end",
    }
  }

  pub fn has_worker(&self) -> bool {
    !matches!(self, Step::PauseForApproval | Step::End)
  }
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Progress of a single step within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
  #[default]
  Pending,
  InProgress,
  Completed,
  Failed,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_serialized_names_match_display() {
    for step in Step::WORKERS
      .iter()
      .chain([Step::PauseForApproval, Step::End].iter())
    {
      let json = serde_json::to_value(step).unwrap();
      assert_eq!(json, serde_json::Value::String(step.to_string()));
    }
  }

  #[test]
  fn test_control_points_have_no_worker() {
    assert!(Step::WORKERS.iter().all(Step::has_worker));
    assert!(!Step::PauseForApproval.has_worker());
    assert!(!Step::End.has_worker());
  }
}
