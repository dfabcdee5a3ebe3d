use async_trait::async_trait;
use lector_engine::{StepWorker, WorkerError};
use lector_state::{RunState, Step};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::check::word_count;
use crate::intake::{Complexity, IntakeReport};

const APPROVAL_SECONDS: u64 = 60;
const APPROVAL_PAGES: i64 = 15;
const PARALLEL_WORDS: usize = 500;

pub const APPROVAL_REASON: &str = "Estimated runtime exceeds approval threshold.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
  pub plan: Vec<String>,
  pub estimated_duration_seconds: u64,
  pub requires_approval: bool,
  pub approval_reason: Option<String>,
}

/// Chooses a translation strategy and decides whether a human must sign off.
#[derive(Debug, Clone, Default)]
pub struct PlannerWorker;

fn estimate_duration(words: usize, complexity: Complexity) -> u64 {
  let base = (words / 25).max(5) as f64;
  (base * complexity.multiplier()) as u64
}

#[async_trait]
impl StepWorker for PlannerWorker {
  async fn execute(&self, state: &mut RunState) -> Result<serde_json::Value, WorkerError> {
    let intake: Option<IntakeReport> = state
      .result(Step::Intake)
      .cloned()
      .and_then(|value| serde_json::from_value(value).ok());
    let (words, complexity) = match intake {
      Some(report) => (report.word_count, report.estimated_complexity),
      None => (word_count(&state.inputs.raw_text), Complexity::Low),
    };

    let translate = if state.inputs.parallel_execution || words > PARALLEL_WORDS {
      "translate_chunks_parallel"
    } else {
      "translate_single_pass"
    };
    let plan = ["normalize_content", translate, "run_quality_checks", "format_output"]
      .into_iter()
      .map(String::from)
      .collect();

    let estimated = estimate_duration(words, complexity);
    let requires_approval =
      estimated > APPROVAL_SECONDS || state.inputs.page_count > APPROVAL_PAGES;

    info!(
      run_id = %state.run_id,
      estimated_seconds = estimated,
      requires_approval,
      "plan built"
    );
    Ok(serde_json::to_value(Plan {
      plan,
      estimated_duration_seconds: estimated,
      requires_approval,
      approval_reason: requires_approval.then(|| APPROVAL_REASON.to_string()),
    })?)
  }
}
