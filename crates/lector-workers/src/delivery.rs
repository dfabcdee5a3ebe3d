use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lector_engine::{StepWorker, WorkerError};
use lector_state::{RunEvent, RunState, Step, StepStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryMetadata {
  pub document_type: String,
  pub page_count: i64,
  pub retry_count: u32,
  pub processing_time_seconds: f64,
  pub agent_timings: BTreeMap<Step, f64>,
  pub route_history: Vec<Step>,
  pub step_status: BTreeMap<Step, StepStatus>,
  pub events: Vec<RunEvent>,
  pub translation_method: Option<String>,
  pub warnings: Vec<String>,
  pub errors: Vec<String>,
}

/// The final output of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryEnvelope {
  pub run_id: String,
  pub status: String,
  pub source_language: String,
  pub target_language: String,
  pub original_text: String,
  pub translated_text: String,
  pub qa_report: Value,
  pub judge_report: Value,
  pub metadata: DeliveryMetadata,
  pub timestamp: DateTime<Utc>,
}

/// Assembles the delivery envelope from the run record.
#[derive(Debug, Clone, Default)]
pub struct DeliveryWorker;

impl DeliveryWorker {
  pub fn envelope(&self, state: &RunState) -> Result<DeliveryEnvelope, WorkerError> {
    let qa_report = state
      .result(Step::Qa)
      .cloned()
      .ok_or_else(|| WorkerError::failed("QA report is missing"))?;
    let judge_report = state.result(Step::Judge).cloned().unwrap_or_else(|| {
      json!({"score": 0.0, "checks": {}, "rationale": "", "action": "accept"})
    });

    let status = match state.run_status {
      Some(run_status) => run_status.to_string(),
      None => state.status.to_string(),
    };

    let inputs = &state.inputs;
    Ok(DeliveryEnvelope {
      run_id: state.run_id.clone(),
      status,
      source_language: inputs.source_language.clone(),
      target_language: inputs.target_language.clone(),
      original_text: inputs.raw_text.clone(),
      translated_text: state.translation_output.clone().unwrap_or_default(),
      qa_report,
      judge_report,
      metadata: DeliveryMetadata {
        document_type: inputs.document_type.clone(),
        page_count: inputs.page_count,
        retry_count: state.retry_count,
        processing_time_seconds: state.processing_time_seconds(),
        agent_timings: state.agent_timings.clone(),
        route_history: state.route_history.clone(),
        step_status: state.step_status.clone(),
        events: state.events.clone(),
        translation_method: state.translation_method.clone(),
        warnings: state.warnings.to_vec(),
        errors: state.errors.to_vec(),
      },
      timestamp: Utc::now(),
    })
  }
}

#[async_trait]
impl StepWorker for DeliveryWorker {
  async fn execute(&self, state: &mut RunState) -> Result<Value, WorkerError> {
    let envelope = self.envelope(state)?;
    info!(
      run_id = %state.run_id,
      status = %envelope.status,
      translated_chars = envelope.translated_text.len(),
      "delivery assembled"
    );
    Ok(serde_json::to_value(envelope)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use lector_config::TranslationRequest;
  use lector_state::{RunStatus, Status};

  fn state() -> RunState {
    let mut state = RunState::new(TranslationRequest::new("en", "es", "The Client pays."));
    state.status = Status::Completed;
    state.run_status = Some(RunStatus::CompletedWithWarnings);
    state.translation_output = Some("[es] The Cliente pays.".to_string());
    state.translation_method = Some("mock".to_string());
    state.retry_count = 1;
    state
  }

  #[test]
  fn test_missing_qa_report_is_an_error() {
    let err = DeliveryWorker.envelope(&state()).unwrap_err();
    assert_eq!(err.to_string(), "QA report is missing");
  }

  #[test]
  fn test_envelope_fields() {
    let mut s = state();
    s.results
      .insert(Step::Qa, json!({"status": "pass", "quality_score": 100.0}));

    let envelope = DeliveryWorker.envelope(&s).unwrap();

    assert_eq!(envelope.run_id, s.run_id);
    assert_eq!(envelope.status, "completed_with_warnings");
    assert_eq!(envelope.translated_text, "[es] The Cliente pays.");
    assert_eq!(envelope.original_text, "The Client pays.");
    assert_eq!(envelope.qa_report["status"], "pass");
    assert_eq!(envelope.judge_report["action"], "accept");
    assert_eq!(envelope.metadata.retry_count, 1);
    assert_eq!(envelope.metadata.translation_method.as_deref(), Some("mock"));
    assert_eq!(envelope.metadata.document_type, "legal");
  }
}
