//! Folding a step's output into the run record.

use lector_state::{RunState, Step};
use serde_json::Value;

pub(crate) const QA_FAILED_WARNING: &str =
  "QA check failed. Workflow may retry or require review.";
pub(crate) const MOCK_PATH_WARNING: &str = "Mock translation path used.";

/// Method label reported by the offline translator.
pub const MOCK_METHOD: &str = "mock";

/// Merge `output` from `step` into `state`.
///
/// Every step's output lands in `results`; a retry overwrites the earlier
/// attempt. Execution also sets the translation fields, delivery becomes the
/// final output, and QA and judge outcomes that ask for rework leave a
/// warning behind. A mock translation on a run that asked for a real model
/// is flagged too.
pub(crate) fn merge_result(state: &mut RunState, step: Step, output: Value) {
  match step {
    Step::Execution => {
      state.translation_output = Some(
        output
          .get("translation")
          .and_then(Value::as_str)
          .unwrap_or_default()
          .to_string(),
      );
      state.translation_method = output
        .get("method")
        .and_then(Value::as_str)
        .map(String::from);
      let mock_used = state.translation_method.as_deref() == Some(MOCK_METHOD);
      if mock_used && state.inputs.requested_real_llm {
        state.add_warning(MOCK_PATH_WARNING);
      }
    }
    Step::Delivery => {
      state.final_output = Some(output.clone());
    }
    _ => {}
  }

  state.results.insert(step, output);

  match step {
    Step::Qa if state.qa_failed() => {
      state.add_warning(QA_FAILED_WARNING);
    }
    Step::Judge if state.judge_requested_retry() => {
      let score = state
        .result(Step::Judge)
        .and_then(|r| r.get("score"))
        .map(Value::to_string)
        .unwrap_or_else(|| "n/a".to_string());
      state.add_warning(format!("Judge requested action: retry (score={score})."));
    }
    _ => {}
  }
}
