//! Caller-facing response shapes built from a finished (or paused) run.

use std::collections::BTreeMap;

use lector_state::{RunEvent, RunState, RunStatus, Status, Step, StepStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Response for a run waiting on the approval gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PausedResponse {
  pub run_id: String,
  pub status: RunStatus,
  pub pause_reason: Option<String>,
  pub current_step: Option<Step>,
  pub route_history: Vec<Step>,
  pub step_status: BTreeMap<Step, StepStatus>,
  pub events: Vec<RunEvent>,
  pub warnings: Vec<String>,
  pub errors: Vec<String>,
}

/// Response for a run that ended in failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedResponse {
  pub run_id: String,
  pub status: RunStatus,
  pub errors: Vec<String>,
  pub warnings: Vec<String>,
}

/// What the caller gets back for a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RunResponse {
  Paused(PausedResponse),
  /// The delivery envelope with status and metadata taken from the final
  /// record.
  Completed(Value),
  Failed(FailedResponse),
}

impl RunResponse {
  pub fn from_state(state: &RunState) -> Self {
    match state.status {
      Status::Paused => RunResponse::Paused(PausedResponse {
        run_id: state.run_id.clone(),
        status: RunStatus::Paused,
        pause_reason: state.pause_reason.clone(),
        current_step: state.current_step,
        route_history: state.route_history.clone(),
        step_status: state.step_status.clone(),
        events: state.events.clone(),
        warnings: state.warnings.to_vec(),
        errors: state.errors.to_vec(),
      }),
      Status::Completed => match &state.final_output {
        Some(envelope) => RunResponse::Completed(refresh_envelope(envelope.clone(), state)),
        None => failed(state),
      },
      _ => failed(state),
    }
  }

  pub fn status(&self) -> RunStatus {
    match self {
      RunResponse::Paused(r) => r.status,
      RunResponse::Failed(r) => r.status,
      RunResponse::Completed(envelope) => envelope
        .get("status")
        .cloned()
        .and_then(|s| serde_json::from_value(s).ok())
        .unwrap_or(RunStatus::Completed),
    }
  }

  pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(self)
  }
}

fn failed(state: &RunState) -> RunResponse {
  RunResponse::Failed(FailedResponse {
    run_id: state.run_id.clone(),
    status: RunStatus::Failed,
    errors: state.errors.to_vec(),
    warnings: state.warnings.to_vec(),
  })
}

/// Bring the stored delivery envelope in line with the record.
pub(crate) fn refresh_final_output(state: &mut RunState) {
  if let Some(envelope) = state.final_output.take() {
    state.final_output = Some(refresh_envelope(envelope, state));
  }
}

fn refresh_envelope(mut envelope: Value, state: &RunState) -> Value {
  let Some(object) = envelope.as_object_mut() else {
    return envelope;
  };

  let run_status = state.run_status.unwrap_or_else(|| state.derive_run_status());
  object.insert("status".to_string(), json!(run_status));

  let metadata = object
    .entry("metadata")
    .or_insert_with(|| Value::Object(Map::new()));
  if !metadata.is_object() {
    *metadata = Value::Object(Map::new());
  }
  if let Some(metadata) = metadata.as_object_mut() {
    metadata.insert("retry_count".to_string(), json!(state.retry_count));
    metadata.insert(
      "processing_time_seconds".to_string(),
      json!(state.processing_time_seconds()),
    );
    metadata.insert("agent_timings".to_string(), json!(state.agent_timings));
    metadata.insert("route_history".to_string(), json!(state.route_history));
    metadata.insert("step_status".to_string(), json!(state.step_status));
    metadata.insert("events".to_string(), json!(state.events));
    metadata.insert("warnings".to_string(), json!(state.warnings.to_vec()));
    metadata.insert("errors".to_string(), json!(state.errors.to_vec()));
  }

  envelope
}

#[cfg(test)]
mod tests {
  use super::*;
  use lector_config::TranslationRequest;
  use lector_state::EventStatus;

  fn state() -> RunState {
    RunState::new(TranslationRequest::new("en", "es", "text"))
  }

  #[test]
  fn test_paused_shape() {
    let mut s = state();
    s.status = Status::Paused;
    s.run_status = Some(RunStatus::Paused);
    s.pause_reason = Some("Awaiting human approval".to_string());
    s.current_step = Some(Step::Planner);
    s.route_history = vec![Step::Intake, Step::Planner];

    let value = serde_json::to_value(RunResponse::from_state(&s)).unwrap();
    assert_eq!(value["status"], "paused");
    assert_eq!(value["pause_reason"], "Awaiting human approval");
    assert_eq!(value["current_step"], "planner");
    assert_eq!(value["route_history"], json!(["intake", "planner"]));
    assert!(value.get("translated_text").is_none());
  }

  #[test]
  fn test_failed_shape() {
    let mut s = state();
    s.status = Status::Failed;
    s.run_status = Some(RunStatus::Failed);
    s.add_error("raw_text is required");

    let response = RunResponse::from_state(&s);
    assert_eq!(response.status(), RunStatus::Failed);

    let value = serde_json::to_value(response).unwrap();
    assert_eq!(value["status"], "failed");
    assert_eq!(value["errors"], json!(["raw_text is required"]));
    assert_eq!(value["warnings"], json!([]));
  }

  #[test]
  fn test_refresh_final_output_updates_record() {
    let mut s = state();
    s.status = Status::Completed;
    s.run_status = Some(RunStatus::Completed);
    s.set_step_status(Step::Delivery, StepStatus::Completed);
    s.final_output = Some(json!({
      "status": "completed",
      "metadata": {"step_status": {"delivery": "in_progress"}}
    }));

    refresh_final_output(&mut s);

    let envelope = s.final_output.as_ref().unwrap();
    assert_eq!(envelope["metadata"]["step_status"]["delivery"], "completed");
    assert_eq!(envelope["status"], "completed");
  }

  #[test]
  fn test_refresh_without_envelope_is_noop() {
    let mut s = state();
    refresh_final_output(&mut s);
    assert_eq!(s.final_output, None);
  }

  #[test]
  fn test_completed_envelope_is_refreshed() {
    let mut s = state();
    s.status = Status::Completed;
    s.run_status = Some(RunStatus::CompletedWithWarnings);
    s.retry_count = 1;
    s.add_warning("Retrying translation, attempt 1");
    s.route_history = vec![Step::Intake, Step::Delivery];
    s.record_event(RunEvent::info(
      "workflow",
      EventStatus::CompletedWithWarnings,
      "Workflow finished with status: completed_with_warnings",
    ));
    s.final_output = Some(json!({
      "run_id": s.run_id.clone(),
      "status": "completed",
      "translated_text": "[es] texto",
      "metadata": {"retry_count": 0, "document_type": "legal"}
    }));

    let response = RunResponse::from_state(&s);
    assert_eq!(response.status(), RunStatus::CompletedWithWarnings);

    let value = serde_json::to_value(response).unwrap();
    assert_eq!(value["status"], "completed_with_warnings");
    assert_eq!(value["translated_text"], "[es] texto");
    assert_eq!(value["metadata"]["retry_count"], 1);
    assert_eq!(value["metadata"]["document_type"], "legal");
    assert_eq!(value["metadata"]["events"].as_array().unwrap().len(), 1);
    assert_eq!(
      value["metadata"]["warnings"],
      json!(["Retrying translation, attempt 1"])
    );
  }
}
