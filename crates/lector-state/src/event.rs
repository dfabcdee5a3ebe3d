//! Timeline entries recorded on a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::RunStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
  Info,
  Warning,
  Error,
}

/// What happened, as seen on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
  Started,
  InProgress,
  Completed,
  CompletedWithWarnings,
  Failed,
  Retry,
  SlaWarning,
  Paused,
  AutoApproved,
  Approved,
  Denied,
}

impl From<RunStatus> for EventStatus {
  fn from(status: RunStatus) -> Self {
    match status {
      RunStatus::Completed => EventStatus::Completed,
      RunStatus::CompletedWithWarnings => EventStatus::CompletedWithWarnings,
      RunStatus::Failed => EventStatus::Failed,
      RunStatus::Paused => EventStatus::Paused,
    }
  }
}

/// A single timestamped timeline entry.
///
/// `step` is a pipeline step name, or one of the pseudo-steps `workflow`
/// and `approval` for run-level transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
  pub timestamp: DateTime<Utc>,
  pub step: String,
  pub status: EventStatus,
  pub level: EventLevel,
  pub message: String,
}

impl RunEvent {
  pub fn new(
    step: impl Into<String>,
    status: EventStatus,
    level: EventLevel,
    message: impl Into<String>,
  ) -> Self {
    Self {
      timestamp: Utc::now(),
      step: step.into(),
      status,
      level,
      message: message.into(),
    }
  }

  pub fn info(step: impl Into<String>, status: EventStatus, message: impl Into<String>) -> Self {
    Self::new(step, status, EventLevel::Info, message)
  }

  pub fn warning(step: impl Into<String>, status: EventStatus, message: impl Into<String>) -> Self {
    Self::new(step, status, EventLevel::Warning, message)
  }

  pub fn error(step: impl Into<String>, status: EventStatus, message: impl Into<String>) -> Self {
    Self::new(step, status, EventLevel::Error, message)
  }
}
