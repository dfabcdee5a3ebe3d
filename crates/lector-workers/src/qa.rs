use std::collections::BTreeMap;

use async_trait::async_trait;
use lector_engine::{StepWorker, WorkerError};
use lector_state::RunState;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::check::{Check, newline_count, word_count};

const LEGAL_TERMS: [&str; 5] = ["agreement", "contract", "party", "clause", "liability"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QaStatus {
  Pass,
  Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaReport {
  pub status: QaStatus,
  pub quality_score: f64,
  pub checks: BTreeMap<String, Check>,
  pub failed_checks: Vec<String>,
  pub warnings: Vec<String>,
  pub recommendations: Vec<String>,
}

/// Rule-based quality gate over the current translation.
#[derive(Debug, Clone, Default)]
pub struct QaWorker;

fn length_check(source: &str, translation: &str) -> Check {
  if translation.is_empty() {
    return Check::fail("Translation is empty").with_detail("ratio", 0.0);
  }
  let ratio = word_count(translation) as f64 / word_count(source).max(1) as f64;
  Check::new((0.65..=1.6).contains(&ratio), "Length check").with_detail("ratio", ratio)
}

fn format_check(source: &str, translation: &str) -> Check {
  let source_lines = newline_count(source);
  let line_diff = source_lines.abs_diff(newline_count(translation));
  let tolerance = ((source_lines.max(1) as f64 * 0.35) as usize).max(4);
  Check::new(line_diff <= tolerance, "Format check")
    .with_detail("line_diff", line_diff)
    .with_detail("tolerance", tolerance)
}

fn terminology_check(source: &str, document_type: &str) -> Check {
  if !document_type.eq_ignore_ascii_case("legal") {
    return Check::pass("Terminology check skipped");
  }
  let lowered = source.to_lowercase();
  let found = LEGAL_TERMS
    .iter()
    .filter(|term| lowered.contains(*term))
    .count();
  if found == 0 {
    Check::pass("No known legal terms found. Treated as warning only.")
      .with_warning(true)
      .with_detail("terms_found", found)
  } else {
    Check::pass("Legal terminology detected.").with_detail("terms_found", found)
  }
}

fn recommendations(failed: &[String], warnings: &[String]) -> Vec<String> {
  let failed_has = |name: &str| failed.iter().any(|f| f == name);
  let mut out = Vec::new();
  if failed_has("length_check") {
    out.push("Review translation length for missing or extra content.");
  }
  if failed_has("format_check") {
    out.push("Restore line/section formatting.");
  }
  if failed_has("terminology_check") {
    out.push("Validate domain terminology consistency.");
  }
  if warnings.iter().any(|w| w == "terminology_check") {
    out.push("Setting Document type to non-legal is recommended for non-legal documents.");
  }
  if failed_has("forced_failure") {
    out.push("Retry triggered as part of QA safety drill.");
  }
  if out.is_empty() && !failed.is_empty() {
    out.push("Perform manual reviewer spot-check.");
  }
  out.into_iter().map(String::from).collect()
}

impl QaWorker {
  pub fn assess(&self, state: &RunState) -> QaReport {
    let inputs = &state.inputs;
    let translation = state.translation_output.as_deref().unwrap_or_default();

    let mut ordered = vec![
      ("length_check", length_check(&inputs.raw_text, translation)),
      ("format_check", format_check(&inputs.raw_text, translation)),
      (
        "terminology_check",
        terminology_check(&inputs.raw_text, &inputs.document_type),
      ),
    ];

    let warnings: Vec<String> = ordered
      .iter()
      .filter(|(_, check)| check.warning)
      .map(|(name, _)| name.to_string())
      .collect();

    if inputs.force_qa_fail_once && state.retry_count == 0 {
      ordered.push(("forced_failure", Check::fail("Intentional first-pass failure")));
    }

    let failed_checks: Vec<String> = ordered
      .iter()
      .filter(|(_, check)| !check.passed)
      .map(|(name, _)| name.to_string())
      .collect();

    let passed = ordered.iter().filter(|(_, check)| check.passed).count();
    let quality_score = passed as f64 / ordered.len() as f64 * 100.0;

    let status = if failed_checks.is_empty() && quality_score >= inputs.quality_threshold {
      QaStatus::Pass
    } else {
      QaStatus::Fail
    };

    QaReport {
      status,
      quality_score,
      recommendations: recommendations(&failed_checks, &warnings),
      checks: ordered
        .into_iter()
        .map(|(name, check)| (name.to_string(), check))
        .collect(),
      failed_checks,
      warnings,
    }
  }
}

#[async_trait]
impl StepWorker for QaWorker {
  async fn execute(&self, state: &mut RunState) -> Result<serde_json::Value, WorkerError> {
    let report = self.assess(state);
    info!(
      run_id = %state.run_id,
      status = ?report.status,
      quality_score = report.quality_score,
      failed_checks = ?report.failed_checks,
      "qa completed"
    );
    Ok(serde_json::to_value(report)?)
  }
}
