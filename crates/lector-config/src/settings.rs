//! Settings that supply request defaults and supervisor policy.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::request::TranslationRequest;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub default_source_language: String,
  pub default_target_language: String,
  pub default_document_type: String,
  pub default_max_retries: u32,
  /// Elapsed-time budget for a run before an SLA warning is recorded.
  pub sla_seconds: u64,
  /// Resolve approval gates automatically instead of pausing.
  pub auto_approve: bool,
  /// Translate through Gemini instead of the offline mock.
  pub use_real_llm: bool,
  pub gemini_model: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub google_api_key: Option<String>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      default_source_language: "en".to_string(),
      default_target_language: "es".to_string(),
      default_document_type: "legal".to_string(),
      default_max_retries: 1,
      sla_seconds: 120,
      auto_approve: true,
      use_real_llm: false,
      gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
      google_api_key: None,
    }
  }
}

impl Settings {
  /// Parse settings from a JSON string. Missing fields take their defaults.
  pub fn from_json(content: &str, origin: &Path) -> Result<Self, ConfigError> {
    let settings: Settings = serde_json::from_str(content).map_err(|e| ConfigError::Parse {
      path: origin.to_path_buf(),
      source: e,
    })?;
    settings.validate()?;
    Ok(settings)
  }

  /// Load settings from a JSON file.
  pub async fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = tokio::fs::read_to_string(path)
      .await
      .map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
      })?;
    Self::from_json(&content, path)
  }

  /// Load settings from a JSON file, falling back to defaults if the file
  /// does not exist.
  pub async fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
    match tokio::fs::try_exists(path).await {
      Ok(true) => Self::load(path).await,
      Ok(false) => Ok(Self::default()),
      Err(e) => Err(ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
      }),
    }
  }

  fn validate(&self) -> Result<(), ConfigError> {
    if self.default_source_language.trim().is_empty() {
      return Err(ConfigError::Invalid(
        "default_source_language must not be empty".to_string(),
      ));
    }
    if self.default_target_language.trim().is_empty() {
      return Err(ConfigError::Invalid(
        "default_target_language must not be empty".to_string(),
      ));
    }
    if self.use_real_llm && self.gemini_model.trim().is_empty() {
      return Err(ConfigError::Invalid(
        "gemini_model must not be empty when use_real_llm is set".to_string(),
      ));
    }
    Ok(())
  }

  /// The API key, if one is set and not blank.
  pub fn api_key(&self) -> Option<&str> {
    self
      .google_api_key
      .as_deref()
      .map(str::trim)
      .filter(|key| !key.is_empty())
  }

  pub fn sla(&self) -> Duration {
    Duration::from_secs(self.sla_seconds)
  }

  /// Build a request for the given text using the configured defaults.
  pub fn request(&self, raw_text: impl Into<String>) -> TranslationRequest {
    TranslationRequest::new(
      self.default_source_language.clone(),
      self.default_target_language.clone(),
      raw_text,
    )
    .with_document_type(self.default_document_type.clone())
    .with_max_retries(self.default_max_retries)
    .with_real_llm_requested(self.use_real_llm)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_partial_settings_fill_defaults() {
    let settings =
      Settings::from_json(r#"{"sla_seconds": 30}"#, Path::new("settings.json")).unwrap();

    assert_eq!(settings.sla(), Duration::from_secs(30));
    assert_eq!(settings.default_source_language, "en");
    assert!(settings.auto_approve);
    assert!(!settings.use_real_llm);
    assert_eq!(settings.gemini_model, "gemini-2.5-flash");
    assert_eq!(settings.google_api_key, None);
  }

  #[test]
  fn test_real_llm_requires_model() {
    let err = Settings::from_json(
      r#"{"use_real_llm": true, "gemini_model": ""}"#,
      Path::new("settings.json"),
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::Invalid(_)));
  }

  #[test]
  fn test_blank_api_key_counts_as_missing() {
    let settings = Settings {
      google_api_key: Some("   ".to_string()),
      ..Settings::default()
    };
    assert_eq!(settings.api_key(), None);

    let settings = Settings {
      google_api_key: Some("secret".to_string()),
      ..Settings::default()
    };
    assert_eq!(settings.api_key(), Some("secret"));
  }

  #[test]
  fn test_empty_language_rejected() {
    let err = Settings::from_json(
      r#"{"default_target_language": "  "}"#,
      Path::new("settings.json"),
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::Invalid(_)));
  }

  #[test]
  fn test_request_uses_defaults() {
    let settings = Settings {
      default_target_language: "de".to_string(),
      default_max_retries: 2,
      ..Settings::default()
    };

    let request = settings.request("Hallo");
    assert_eq!(request.source_language, "en");
    assert_eq!(request.target_language, "de");
    assert_eq!(request.max_retries, 2);
    assert_eq!(request.raw_text, "Hallo");
    assert!(!request.requested_real_llm);

    let settings = Settings {
      use_real_llm: true,
      ..Settings::default()
    };
    assert!(settings.request("Hallo").requested_real_llm);
  }

  #[tokio::test]
  async fn test_load_or_default_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load_or_default(&dir.path().join("settings.json"))
      .await
      .unwrap();

    assert_eq!(settings, Settings::default());
  }

  #[tokio::test]
  async fn test_load_reports_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    tokio::fs::write(&path, "{ not json").await.unwrap();

    let err = Settings::load(&path).await.unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
  }
}
