use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
  #[default]
  Pending,
  InProgress,
  Completed,
  Failed,
  Paused,
}

impl Status {
  pub fn as_str(&self) -> &'static str {
    match self {
      Status::Pending => "pending",
      Status::InProgress => "in_progress",
      Status::Completed => "completed",
      Status::Failed => "failed",
      Status::Paused => "paused",
    }
  }
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Quality-aware terminal label of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
  Completed,
  CompletedWithWarnings,
  Failed,
  Paused,
}

impl RunStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      RunStatus::Completed => "completed",
      RunStatus::CompletedWithWarnings => "completed_with_warnings",
      RunStatus::Failed => "failed",
      RunStatus::Paused => "paused",
    }
  }
}

impl fmt::Display for RunStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Outcome of the human approval gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Approval {
  #[default]
  Unset,
  Granted,
  Denied,
}
