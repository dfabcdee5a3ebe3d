use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use lector_config::TranslationRequest;
use serde::{Deserialize, Serialize};

use crate::event::RunEvent;
use crate::messages::MessageSet;
use crate::snapshot::ProgressSnapshot;
use crate::status::{Approval, RunStatus, Status};
use crate::step::{Step, StepStatus};

const DEFAULT_QUALITY_THRESHOLD: f64 = 75.0;

/// Request inputs, fixed for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInputs {
  pub source_language: String,
  pub target_language: String,
  pub document_type: String,
  pub page_count: i64,
  pub raw_text: String,
  pub parallel_execution: bool,
  pub force_qa_fail_once: bool,
  pub quality_threshold: f64,
  #[serde(default)]
  pub requested_real_llm: bool,
}

/// The record of one translation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
  pub run_id: String,
  pub created_at: DateTime<Utc>,
  pub inputs: RunInputs,
  pub max_retries: u32,

  pub status: Status,
  pub run_status: Option<RunStatus>,
  pub current_step: Option<Step>,
  pub route_history: Vec<Step>,
  pub step_status: BTreeMap<Step, StepStatus>,
  pub events: Vec<RunEvent>,
  pub retry_count: u32,

  /// Step outputs keyed by the producing step.
  pub results: BTreeMap<Step, serde_json::Value>,
  pub translation_output: Option<String>,
  pub translation_method: Option<String>,
  pub final_output: Option<serde_json::Value>,

  pub warnings: MessageSet,
  pub errors: MessageSet,

  pub approval_granted: Approval,
  pub pause_reason: Option<String>,

  /// Seconds spent in each step's most recent execution.
  pub agent_timings: BTreeMap<Step, f64>,
  pub start_time: Option<DateTime<Utc>>,
  pub end_time: Option<DateTime<Utc>>,
  /// When the run last stopped at the approval gate.
  #[serde(default)]
  pub paused_at: Option<DateTime<Utc>>,
  /// Milliseconds spent waiting on approval decisions.
  #[serde(default)]
  pub paused_millis: i64,
}

impl RunState {
  /// Create a pending run record from a request.
  pub fn new(request: TranslationRequest) -> Self {
    Self {
      run_id: uuid::Uuid::new_v4().to_string(),
      created_at: Utc::now(),
      inputs: RunInputs {
        source_language: request.source_language,
        target_language: request.target_language,
        document_type: request.document_type,
        page_count: request.page_count,
        raw_text: request.raw_text,
        parallel_execution: request.parallel_execution,
        force_qa_fail_once: request.force_qa_fail_once,
        quality_threshold: request
          .quality_threshold
          .unwrap_or(DEFAULT_QUALITY_THRESHOLD),
        requested_real_llm: request.requested_real_llm,
      },
      max_retries: request.max_retries,
      status: Status::Pending,
      run_status: None,
      current_step: None,
      route_history: Vec::new(),
      step_status: Self::pending_steps(),
      events: Vec::new(),
      retry_count: 0,
      results: BTreeMap::new(),
      translation_output: None,
      translation_method: None,
      final_output: None,
      warnings: MessageSet::from(request.warnings),
      errors: MessageSet::new(),
      approval_granted: Approval::Unset,
      pause_reason: None,
      agent_timings: BTreeMap::new(),
      start_time: None,
      end_time: None,
      paused_at: None,
      paused_millis: 0,
    }
  }

  /// Every worker step, marked pending.
  pub fn pending_steps() -> BTreeMap<Step, StepStatus> {
    Step::WORKERS
      .iter()
      .map(|step| (*step, StepStatus::Pending))
      .collect()
  }

  pub fn add_warning(&mut self, message: impl Into<String>) -> bool {
    self.warnings.insert(message)
  }

  pub fn add_error(&mut self, message: impl Into<String>) -> bool {
    self.errors.insert(message)
  }

  pub fn set_step_status(&mut self, step: Step, status: StepStatus) {
    self.step_status.insert(step, status);
  }

  pub fn step_status(&self, step: Step) -> StepStatus {
    self.step_status.get(&step).copied().unwrap_or_default()
  }

  pub fn record_event(&mut self, event: RunEvent) {
    self.events.push(event);
  }

  /// The last `limit` events, oldest first.
  pub fn recent_events(&self, limit: usize) -> &[RunEvent] {
    let start = self.events.len().saturating_sub(limit);
    &self.events[start..]
  }

  pub fn result(&self, step: Step) -> Option<&serde_json::Value> {
    self.results.get(&step)
  }

  fn result_str(&self, step: Step, field: &str) -> Option<String> {
    self
      .result(step)
      .and_then(|r| r.get(field))
      .and_then(|v| v.as_str())
      .map(|s| s.trim().to_lowercase())
  }

  /// Whether the planner asked for a human approval gate.
  pub fn approval_requested(&self) -> bool {
    self
      .result(Step::Planner)
      .and_then(|r| r.get("requires_approval"))
      .and_then(|v| v.as_bool())
      .unwrap_or(false)
  }

  pub fn approval_reason(&self) -> Option<&str> {
    self
      .result(Step::Planner)
      .and_then(|r| r.get("approval_reason"))
      .and_then(|v| v.as_str())
  }

  /// Whether the most recent QA result reported a failure.
  pub fn qa_failed(&self) -> bool {
    self.result_str(Step::Qa, "status").as_deref() == Some("fail")
  }

  /// The most recent judge action, lowercased. `None` before the judge ran.
  pub fn judge_action(&self) -> Option<String> {
    self.result_str(Step::Judge, "action")
  }

  pub fn judge_requested_retry(&self) -> bool {
    self.judge_action().as_deref() == Some("retry")
  }

  pub fn is_paused(&self) -> bool {
    self.status == Status::Paused
  }

  /// Derive the refined terminal label from the current record.
  ///
  /// Pure: reads the record, never touches warnings or errors.
  pub fn derive_run_status(&self) -> RunStatus {
    match self.status {
      Status::Failed => return RunStatus::Failed,
      Status::Paused => return RunStatus::Paused,
      _ => {}
    }

    let judge_accepted = self
      .judge_action()
      .map(|action| action == "accept")
      .unwrap_or(true);

    if !self.errors.is_empty()
      || !self.warnings.is_empty()
      || self.qa_failed()
      || !judge_accepted
      || self.retry_count > 0
    {
      RunStatus::CompletedWithWarnings
    } else {
      RunStatus::Completed
    }
  }

  /// Close the current pause, adding its length to `paused_millis`.
  pub fn mark_resumed(&mut self, at: DateTime<Utc>) {
    if let Some(paused_at) = self.paused_at.take() {
      self.paused_millis += (at - paused_at).num_milliseconds().max(0);
    }
  }

  /// Start time shifted forward by the time spent paused, so deadline
  /// checks only count active work.
  pub fn active_start(&self) -> Option<DateTime<Utc>> {
    self
      .start_time
      .map(|start| start + TimeDelta::milliseconds(self.paused_millis))
  }

  /// Seconds between the start of the run and its end (or now, if still running).
  pub fn processing_time_seconds(&self) -> f64 {
    match self.start_time {
      Some(start) => {
        let end = self.end_time.unwrap_or_else(Utc::now);
        (end - start).num_milliseconds() as f64 / 1000.0
      }
      None => 0.0,
    }
  }

  pub fn snapshot(&self) -> ProgressSnapshot {
    ProgressSnapshot {
      run_id: self.run_id.clone(),
      current_step: self.current_step,
      status: self.status,
      run_status: self.run_status,
      step_status: self.step_status.clone(),
      retry_count: self.retry_count,
      warnings: self.warnings.to_vec(),
      errors: self.errors.to_vec(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::event::EventStatus;
  use serde_json::json;

  fn request() -> TranslationRequest {
    TranslationRequest::new("en", "es", "This Agreement is entered into.")
  }

  #[test]
  fn test_new_state_is_pending_with_all_steps() {
    let state = RunState::new(request());

    assert_eq!(state.status, Status::Pending);
    assert_eq!(state.run_status, None);
    assert_eq!(state.step_status.len(), 6);
    assert!(
      state
        .step_status
        .values()
        .all(|s| *s == StepStatus::Pending)
    );
    assert!(!state.step_status.contains_key(&Step::PauseForApproval));
    assert_eq!(state.inputs.quality_threshold, 75.0);
    assert_eq!(state.approval_granted, Approval::Unset);
  }

  #[test]
  fn test_request_warnings_seed_the_record() {
    let state = RunState::new(
      request()
        .with_warning("no key")
        .with_warning("no key")
        .with_real_llm_requested(true),
    );

    assert_eq!(state.warnings.to_vec(), vec!["no key".to_string()]);
    assert!(state.inputs.requested_real_llm);
  }

  #[test]
  fn test_run_ids_are_unique() {
    assert_ne!(RunState::new(request()).run_id, RunState::new(request()).run_id);
  }

  #[test]
  fn test_qa_and_judge_accessors() {
    let mut state = RunState::new(request());
    assert!(!state.qa_failed());
    assert_eq!(state.judge_action(), None);

    state.results.insert(Step::Qa, json!({"status": "FAIL"}));
    state
      .results
      .insert(Step::Judge, json!({"action": "Retry", "score": 42.0}));

    assert!(state.qa_failed());
    assert!(state.judge_requested_retry());
  }

  #[test]
  fn test_approval_accessors() {
    let mut state = RunState::new(request());
    assert!(!state.approval_requested());

    state.results.insert(
      Step::Planner,
      json!({"requires_approval": true, "approval_reason": "too long"}),
    );

    assert!(state.approval_requested());
    assert_eq!(state.approval_reason(), Some("too long"));
  }

  #[test]
  fn test_derive_run_status_clean_run() {
    let mut state = RunState::new(request());
    state.status = Status::Completed;
    state.results.insert(Step::Qa, json!({"status": "pass"}));
    state.results.insert(Step::Judge, json!({"action": "accept"}));

    assert_eq!(state.derive_run_status(), RunStatus::Completed);
  }

  #[test]
  fn test_derive_run_status_degrades_on_quality_signals() {
    let mut state = RunState::new(request());
    state.status = Status::Completed;
    state
      .results
      .insert(Step::Judge, json!({"action": "human_review"}));
    assert_eq!(state.derive_run_status(), RunStatus::CompletedWithWarnings);

    let mut state = RunState::new(request());
    state.status = Status::Completed;
    state.retry_count = 1;
    assert_eq!(state.derive_run_status(), RunStatus::CompletedWithWarnings);

    let mut state = RunState::new(request());
    state.status = Status::Completed;
    state.add_warning("SLA threshold exceeded");
    assert_eq!(state.derive_run_status(), RunStatus::CompletedWithWarnings);
  }

  #[test]
  fn test_derive_run_status_failed_wins() {
    let mut state = RunState::new(request());
    state.status = Status::Failed;
    state.results.insert(Step::Judge, json!({"action": "accept"}));

    assert_eq!(state.derive_run_status(), RunStatus::Failed);
  }

  #[test]
  fn test_derive_run_status_is_idempotent_and_pure() {
    let mut state = RunState::new(request());
    state.status = Status::Completed;
    state.add_warning("QA check failed");
    let before = state.clone();

    let first = state.derive_run_status();
    let second = state.derive_run_status();

    assert_eq!(first, second);
    assert_eq!(state, before);
  }

  #[test]
  fn test_paused_time_shifts_active_start() {
    let mut state = RunState::new(request());
    let start = Utc::now();
    state.start_time = Some(start);
    assert_eq!(state.active_start(), Some(start));

    state.paused_at = Some(start + TimeDelta::seconds(10));
    state.mark_resumed(start + TimeDelta::seconds(250));

    assert_eq!(state.paused_at, None);
    assert_eq!(state.paused_millis, 240_000);
    assert_eq!(state.active_start(), Some(start + TimeDelta::seconds(240)));

    // resuming twice adds nothing
    state.mark_resumed(start + TimeDelta::seconds(900));
    assert_eq!(state.paused_millis, 240_000);
  }

  #[test]
  fn test_recent_events_returns_suffix() {
    let mut state = RunState::new(request());
    for i in 0..5 {
      state.record_event(RunEvent::info("workflow", EventStatus::Started, format!("e{i}")));
    }

    let recent = state.recent_events(2);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].message, "e3");
    assert_eq!(recent[1].message, "e4");
    assert_eq!(state.recent_events(50).len(), 5);
  }

  #[test]
  fn test_persisted_record_reads_back() {
    let mut state = RunState::new(request());
    state.status = Status::Paused;
    state.pause_reason = Some("Awaiting human approval".to_string());
    state.route_history = vec![Step::Intake, Step::Planner];
    state.set_step_status(Step::Intake, StepStatus::Completed);
    state.agent_timings.insert(Step::Intake, 0.25);
    state.add_warning("first");

    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["status"], "paused");
    assert_eq!(json["route_history"], json!(["intake", "planner"]));
    assert_eq!(json["step_status"]["intake"], "completed");
    assert_eq!(json["approval_granted"], "unset");

    let restored: RunState = serde_json::from_value(json).unwrap();
    assert_eq!(restored, state);
  }
}
