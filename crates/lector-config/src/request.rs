use serde::{Deserialize, Serialize};

/// A document translation request as accepted from a caller.
///
/// Every field except the languages and the text has a default, so a
/// minimal request file only needs those three.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationRequest {
  pub source_language: String,
  pub target_language: String,
  #[serde(default = "default_document_type")]
  pub document_type: String,
  /// Signed so that intake can reject non-positive counts instead of
  /// failing deserialization.
  #[serde(default = "default_page_count")]
  pub page_count: i64,
  pub raw_text: String,
  #[serde(default = "default_max_retries")]
  pub max_retries: u32,
  #[serde(default)]
  pub parallel_execution: bool,
  /// Test mode: QA fails the first pass regardless of quality.
  #[serde(default)]
  pub force_qa_fail_once: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub quality_threshold: Option<f64>,
  /// The caller asked for a model-backed translation.
  #[serde(default)]
  pub requested_real_llm: bool,
  /// Warnings raised before the run started, carried onto the record.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub warnings: Vec<String>,
}

fn default_document_type() -> String {
  "legal".to_string()
}

fn default_page_count() -> i64 {
  1
}

fn default_max_retries() -> u32 {
  1
}

impl TranslationRequest {
  /// Create a request with default flags.
  pub fn new(
    source_language: impl Into<String>,
    target_language: impl Into<String>,
    raw_text: impl Into<String>,
  ) -> Self {
    Self {
      source_language: source_language.into(),
      target_language: target_language.into(),
      document_type: default_document_type(),
      page_count: default_page_count(),
      raw_text: raw_text.into(),
      max_retries: default_max_retries(),
      parallel_execution: false,
      force_qa_fail_once: false,
      quality_threshold: None,
      requested_real_llm: false,
      warnings: Vec::new(),
    }
  }

  pub fn with_document_type(mut self, document_type: impl Into<String>) -> Self {
    self.document_type = document_type.into();
    self
  }

  pub fn with_page_count(mut self, page_count: i64) -> Self {
    self.page_count = page_count;
    self
  }

  pub fn with_max_retries(mut self, max_retries: u32) -> Self {
    self.max_retries = max_retries;
    self
  }

  pub fn with_parallel_execution(mut self, parallel: bool) -> Self {
    self.parallel_execution = parallel;
    self
  }

  pub fn with_forced_qa_failure(mut self, force: bool) -> Self {
    self.force_qa_fail_once = force;
    self
  }

  pub fn with_real_llm_requested(mut self, requested: bool) -> Self {
    self.requested_real_llm = requested;
    self
  }

  pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
    self.warnings.push(warning.into());
    self
  }
}
