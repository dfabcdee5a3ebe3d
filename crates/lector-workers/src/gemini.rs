//! Gemini `generateContent` translation backend.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::translator::{TranslateError, Translator};

pub const GEMINI_METHOD: &str = "direct_gemini";

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
const TEMPERATURE: f64 = 0.2;

/// Translates chunks by prompting a Gemini model over HTTP.
pub struct GeminiTranslator {
  client: Client,
  api_key: String,
  model: String,
  endpoint: String,
}

impl fmt::Debug for GeminiTranslator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("GeminiTranslator")
      .field("model", &self.model)
      .field("endpoint", &self.endpoint)
      .finish_non_exhaustive()
  }
}

impl GeminiTranslator {
  pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
    Self {
      client: Client::new(),
      api_key: api_key.into(),
      model: model.into(),
      endpoint: DEFAULT_ENDPOINT.to_string(),
    }
  }

  /// Point the client at another host, e.g. a proxy.
  pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
    self.endpoint = endpoint.into();
    self
  }

  fn url(&self) -> String {
    format!(
      "{}/v1beta/models/{}:generateContent",
      self.endpoint.trim_end_matches('/'),
      self.model
    )
  }
}

fn prompt(text: &str, source_language: &str, target_language: &str) -> String {
  format!(
    "Translate from {source_language} to {target_language}. \
     Preserve formatting, numbering, and legal/medical tone as applicable.\n\n\
     Text:\n{text}"
  )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
  contents: Vec<Content>,
  generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
  temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
  #[serde(default)]
  parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
  #[serde(default)]
  text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  content: Option<Content>,
}

impl GenerateRequest {
  fn new(prompt: String) -> Self {
    Self {
      contents: vec![Content {
        parts: vec![Part { text: Some(prompt) }],
      }],
      generation_config: GenerationConfig {
        temperature: TEMPERATURE,
      },
    }
  }
}

impl GenerateResponse {
  /// Text of the first candidate, trimmed. `None` when it is blank.
  fn text(&self) -> Option<String> {
    let content = self.candidates.first()?.content.as_ref()?;
    let text: String = content
      .parts
      .iter()
      .filter_map(|part| part.text.as_deref())
      .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
  }
}

#[async_trait]
impl Translator for GeminiTranslator {
  fn method(&self) -> &str {
    GEMINI_METHOD
  }

  async fn translate(
    &self,
    text: &str,
    source_language: &str,
    target_language: &str,
  ) -> Result<String, TranslateError> {
    let body = GenerateRequest::new(prompt(text, source_language, target_language));

    let response = self
      .client
      .post(self.url())
      .header("x-goog-api-key", &self.api_key)
      .json(&body)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let detail = response.text().await.unwrap_or_default();
      return Err(TranslateError::Unavailable {
        message: format!("gemini returned {status}: {}", detail.trim()),
      });
    }

    let body: GenerateResponse = response.json().await?;
    debug!(model = %self.model, candidates = body.candidates.len(), "gemini responded");
    body.text().ok_or(TranslateError::Empty)
  }
}
