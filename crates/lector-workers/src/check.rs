use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of one quality check.
///
/// Check-specific measurements (ratios, counts, tolerances) live in
/// `details` and are flattened into the check's JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
  pub passed: bool,
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub warning: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub score: Option<f64>,
  pub message: String,
  #[serde(flatten)]
  pub details: Map<String, Value>,
}

impl Check {
  pub fn new(passed: bool, message: impl Into<String>) -> Self {
    Self {
      passed,
      warning: false,
      score: None,
      message: message.into(),
      details: Map::new(),
    }
  }

  pub fn pass(message: impl Into<String>) -> Self {
    Self::new(true, message)
  }

  pub fn fail(message: impl Into<String>) -> Self {
    Self::new(false, message)
  }

  pub fn with_score(mut self, score: f64) -> Self {
    self.score = Some(score);
    self
  }

  pub fn with_warning(mut self, warning: bool) -> Self {
    self.warning = warning;
    self
  }

  pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
    self.details.insert(key.to_string(), value.into());
    self
  }
}

/// Round to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
  (value * 100.0).round() / 100.0
}

pub(crate) fn word_count(text: &str) -> usize {
  text.split_whitespace().count()
}

pub(crate) fn newline_count(text: &str) -> usize {
  text.matches('\n').count()
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_details_are_flattened() {
    let check = Check::pass("Length check").with_detail("ratio", 1.25);
    let value = serde_json::to_value(&check).unwrap();

    assert_eq!(
      value,
      json!({"passed": true, "message": "Length check", "ratio": 1.25})
    );
  }

  #[test]
  fn test_warning_and_score_serialize_when_set() {
    let check = Check::pass("No known legal terms found.")
      .with_warning(true)
      .with_score(100.0);
    let value = serde_json::to_value(&check).unwrap();

    assert_eq!(value["warning"], true);
    assert_eq!(value["score"], 100.0);
  }

  #[test]
  fn test_text_helpers() {
    assert_eq!(word_count("  one two\tthree\n"), 3);
    assert_eq!(newline_count("a\nb\n\nc"), 3);
    assert_eq!(round2(66.666_666), 66.67);
  }
}
