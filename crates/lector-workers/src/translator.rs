//! Translation backends.

use async_trait::async_trait;
use lector_engine::MOCK_METHOD;

/// Errors a translation backend can report.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
  /// The backend could not be reached or refused the request.
  #[error("translation backend unavailable: {message}")]
  Unavailable { message: String },

  /// The backend answered with no text.
  #[error("translation backend returned empty text")]
  Empty,

  /// The HTTP request failed.
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
}

/// Translates one chunk of text.
#[async_trait]
pub trait Translator: Send + Sync {
  /// Name reported as the run's translation method.
  fn method(&self) -> &str;

  async fn translate(
    &self,
    text: &str,
    source_language: &str,
    target_language: &str,
  ) -> Result<String, TranslateError>;
}

const GLOSSARY: &[(&str, &str)] = &[
  ("agreement", "acuerdo"),
  ("client", "cliente"),
  ("firm", "firma"),
  ("services", "servicios"),
  ("payment", "pago"),
  ("termination", "terminacion"),
  ("legal", "legal"),
];

/// Offline translator that swaps a small legal glossary and tags the
/// output with the target language.
#[derive(Debug, Clone, Default)]
pub struct DictionaryTranslator;

impl DictionaryTranslator {
  pub fn translate_text(&self, text: &str, target_language: &str) -> String {
    let mut translated = text.to_string();
    for (source, target) in GLOSSARY {
      translated = translated.replace(source, target);
      translated = translated.replace(&title_case(source), &title_case(target));
    }
    format!("[{target_language}] {translated}")
  }
}

fn title_case(word: &str) -> String {
  let mut chars = word.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

#[async_trait]
impl Translator for DictionaryTranslator {
  fn method(&self) -> &str {
    MOCK_METHOD
  }

  async fn translate(
    &self,
    text: &str,
    _source_language: &str,
    target_language: &str,
  ) -> Result<String, TranslateError> {
    Ok(self.translate_text(text, target_language))
  }
}
