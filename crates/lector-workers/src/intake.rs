use async_trait::async_trait;
use lector_engine::{StepWorker, WorkerError};
use lector_state::RunState;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::check::word_count;

/// Rough size class of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
  #[default]
  Low,
  Medium,
  High,
}

impl Complexity {
  pub fn estimate(word_count: usize, page_count: i64) -> Self {
    if page_count > 10 || word_count > 4000 {
      Complexity::High
    } else if page_count > 3 || word_count > 1200 {
      Complexity::Medium
    } else {
      Complexity::Low
    }
  }

  /// Scaling factor applied to duration estimates.
  pub fn multiplier(&self) -> f64 {
    match self {
      Complexity::Low => 1.0,
      Complexity::Medium => 1.5,
      Complexity::High => 2.0,
    }
  }
}

/// Normalized view of the request produced by intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeReport {
  pub source_language: String,
  pub target_language: String,
  pub document_type: String,
  pub page_count: i64,
  pub word_count: usize,
  pub estimated_complexity: Complexity,
}

/// Validates the request and records its normalized shape.
#[derive(Debug, Clone, Default)]
pub struct IntakeWorker;

impl IntakeWorker {
  fn validate(state: &RunState) -> Vec<String> {
    let inputs = &state.inputs;
    let mut problems = Vec::new();
    if inputs.raw_text.trim().is_empty() {
      problems.push("raw_text is required".to_string());
    }
    if normalize(&inputs.source_language) == normalize(&inputs.target_language) {
      problems.push("source and target language must differ".to_string());
    }
    if inputs.page_count < 1 {
      problems.push("page_count must be >= 1".to_string());
    }
    problems
  }
}

fn normalize(value: &str) -> String {
  value.trim().to_lowercase()
}

#[async_trait]
impl StepWorker for IntakeWorker {
  async fn execute(&self, state: &mut RunState) -> Result<serde_json::Value, WorkerError> {
    let problems = Self::validate(state);
    if !problems.is_empty() {
      return Err(WorkerError::Validation(problems));
    }

    let inputs = &state.inputs;
    let words = word_count(&inputs.raw_text);
    let report = IntakeReport {
      source_language: normalize(&inputs.source_language),
      target_language: normalize(&inputs.target_language),
      document_type: normalize(&inputs.document_type),
      page_count: inputs.page_count,
      word_count: words,
      estimated_complexity: Complexity::estimate(words, inputs.page_count),
    };

    info!(
      run_id = %state.run_id,
      word_count = report.word_count,
      complexity = ?report.estimated_complexity,
      "request validated"
    );
    Ok(serde_json::to_value(report)?)
  }
}
