use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::status::{RunStatus, Status};
use crate::step::{Step, StepStatus};

/// Read-only projection of a run handed to progress observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
  pub run_id: String,
  pub current_step: Option<Step>,
  pub status: Status,
  pub run_status: Option<RunStatus>,
  pub step_status: BTreeMap<Step, StepStatus>,
  pub retry_count: u32,
  pub warnings: Vec<String>,
  pub errors: Vec<String>,
}
