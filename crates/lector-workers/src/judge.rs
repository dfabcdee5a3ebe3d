use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use async_trait::async_trait;
use lector_engine::{StepWorker, WorkerError};
use lector_state::{RunState, Step};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::check::{Check, newline_count, round2, word_count};

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z]{3,}").unwrap());

const RETRY_BELOW: f64 = 60.0;
const REVIEW_BELOW: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgeAction {
  Accept,
  Retry,
  HumanReview,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeReport {
  pub action: JudgeAction,
  pub score: f64,
  pub checks: BTreeMap<String, Check>,
  pub rationale: String,
}

/// Scores translation fidelity and recommends what to do with it.
#[derive(Debug, Clone, Default)]
pub struct JudgeWorker;

fn non_empty(translation: &str) -> Check {
  let ok = !translation.trim().is_empty();
  Check::new(ok, "Non-empty translation").with_score(if ok { 100.0 } else { 0.0 })
}

fn length_ratio(source: &str, translation: &str) -> Check {
  let ratio = word_count(translation) as f64 / word_count(source).max(1) as f64;
  let passed = (0.65..=1.8).contains(&ratio);
  Check::new(passed, "Length ratio")
    .with_score(if passed { 100.0 } else { 40.0 })
    .with_detail("ratio", ratio)
}

fn number_integrity(source: &str, translation: &str) -> Check {
  let source_numbers: Vec<&str> = NUMBER_RE.find_iter(source).map(|m| m.as_str()).collect();
  if source_numbers.is_empty() {
    return Check::pass("No source numerics to compare").with_score(100.0);
  }
  let translated: HashSet<&str> = NUMBER_RE
    .find_iter(translation)
    .map(|m| m.as_str())
    .collect();
  let matched = source_numbers
    .iter()
    .filter(|n| translated.contains(*n))
    .count();
  let coverage = matched as f64 / source_numbers.len() as f64;

  Check::new(coverage >= 0.9, "Numeric integrity")
    .with_score(round2(coverage * 100.0))
    .with_detail("coverage", coverage)
    .with_detail("source_numbers", source_numbers.len())
    .with_detail("matched_numbers", matched)
}

fn line_structure(source: &str, translation: &str) -> Check {
  let diff = newline_count(source).abs_diff(newline_count(translation));
  let passed = diff <= 4;
  let score = if passed {
    100.0
  } else {
    (100.0 - diff as f64 * 10.0).max(35.0)
  };
  Check::new(passed, "Line structure preservation")
    .with_score(score)
    .with_detail("line_diff", diff)
}

fn tokens(text: &str) -> HashSet<String> {
  WORD_RE
    .find_iter(text)
    .map(|m| m.as_str().to_lowercase())
    .collect()
}

fn lexical_shift(
  source: &str,
  translation: &str,
  source_language: &str,
  target_language: &str,
) -> Check {
  let source_tokens = tokens(source);
  if source_tokens.is_empty() {
    return Check::pass("Lexical shift skipped").with_score(100.0);
  }
  let translated_tokens = tokens(translation);
  let overlap = source_tokens.intersection(&translated_tokens).count() as f64
    / source_tokens.len() as f64;
  // same-language output overlaps heavily by nature
  let threshold = if source_language.eq_ignore_ascii_case(target_language) {
    0.8
  } else {
    0.55
  };

  Check::new(overlap <= threshold, "Lexical shift between source and translation")
    .with_score(round2((100.0 - overlap * 100.0).max(20.0)))
    .with_detail("overlap_ratio", overlap)
}

impl JudgeWorker {
  pub fn assess(&self, state: &RunState) -> JudgeReport {
    let inputs = &state.inputs;
    let source = inputs.raw_text.as_str();
    let translation = state.translation_output.as_deref().unwrap_or_default();

    let checks: BTreeMap<String, Check> = [
      ("non_empty_translation", non_empty(translation)),
      ("length_ratio", length_ratio(source, translation)),
      ("number_integrity", number_integrity(source, translation)),
      ("line_structure", line_structure(source, translation)),
      (
        "lexical_shift",
        lexical_shift(
          source,
          translation,
          &inputs.source_language,
          &inputs.target_language,
        ),
      ),
    ]
    .into_iter()
    .map(|(name, check)| (name.to_string(), check))
    .collect();

    let total: f64 = checks.values().filter_map(|c| c.score).sum();
    let score = round2(total / checks.len() as f64);

    let qa_failed_checks: Vec<String> = state
      .result(Step::Qa)
      .and_then(|qa| qa.get("failed_checks"))
      .and_then(|v| v.as_array())
      .map(|names| {
        names
          .iter()
          .filter_map(|n| n.as_str().map(String::from))
          .collect()
      })
      .unwrap_or_default();

    let (action, rationale) = if !qa_failed_checks.is_empty() {
      (
        JudgeAction::HumanReview,
        format!("QA reported failed checks: {}", qa_failed_checks.join(", ")),
      )
    } else if score < RETRY_BELOW {
      (
        JudgeAction::Retry,
        "Low translation quality score. Retry recommended.".to_string(),
      )
    } else if score < REVIEW_BELOW {
      (
        JudgeAction::HumanReview,
        "Translation quality is borderline. Human review recommended.".to_string(),
      )
    } else {
      (JudgeAction::Accept, "Translation is acceptable.".to_string())
    };

    JudgeReport {
      action,
      score,
      checks,
      rationale,
    }
  }
}

#[async_trait]
impl StepWorker for JudgeWorker {
  async fn execute(&self, state: &mut RunState) -> Result<serde_json::Value, WorkerError> {
    let report = self.assess(state);
    info!(
      run_id = %state.run_id,
      action = ?report.action,
      score = report.score,
      "judgement made"
    );
    Ok(serde_json::to_value(report)?)
  }
}
