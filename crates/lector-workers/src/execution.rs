use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use lector_engine::{StepWorker, WorkerError};
use lector_state::RunState;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::translator::{DictionaryTranslator, Translator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutput {
  pub translation: String,
  pub method: String,
  pub segments: usize,
}

/// Translates the document chunk by chunk.
///
/// Chunks are blank-line separated paragraphs. With parallel execution on,
/// all chunks are translated concurrently and joined before returning.
/// A chunk whose translation fails falls back to the dictionary translator
/// and leaves a warning on the run.
pub struct ExecutionWorker {
  translator: Arc<dyn Translator>,
  fallback: DictionaryTranslator,
}

impl ExecutionWorker {
  pub fn new(translator: Arc<dyn Translator>) -> Self {
    Self {
      translator,
      fallback: DictionaryTranslator,
    }
  }
}

impl Default for ExecutionWorker {
  fn default() -> Self {
    Self::new(Arc::new(DictionaryTranslator))
  }
}

fn split_chunks(text: &str) -> Vec<&str> {
  text
    .split("\n\n")
    .map(str::trim)
    .filter(|chunk| !chunk.is_empty())
    .collect()
}

#[async_trait]
impl StepWorker for ExecutionWorker {
  async fn execute(&self, state: &mut RunState) -> Result<serde_json::Value, WorkerError> {
    let raw_text = state.inputs.raw_text.clone();
    let source = state.inputs.source_language.clone();
    let target = state.inputs.target_language.clone();
    let chunks = split_chunks(&raw_text);

    if chunks.is_empty() {
      return Ok(serde_json::to_value(ExecutionOutput {
        translation: String::new(),
        method: "none".to_string(),
        segments: 0,
      })?);
    }

    let attempts = if state.inputs.parallel_execution && chunks.len() > 1 {
      join_all(
        chunks
          .iter()
          .map(|chunk| self.translator.translate(chunk, &source, &target)),
      )
      .await
    } else {
      let mut attempts = Vec::with_capacity(chunks.len());
      for chunk in &chunks {
        attempts.push(self.translator.translate(chunk, &source, &target).await);
      }
      attempts
    };

    let mut translated = Vec::with_capacity(chunks.len());
    for (chunk, attempt) in chunks.iter().zip(attempts) {
      match attempt {
        Ok(text) => translated.push(text),
        Err(e) => {
          warn!(run_id = %state.run_id, error = %e, "translation fell back to dictionary");
          state.add_warning(format!("Translation failed, fallback used: {e}"));
          translated.push(self.fallback.translate_text(chunk, &target));
        }
      }
    }

    info!(
      run_id = %state.run_id,
      segments = chunks.len(),
      method = self.translator.method(),
      "translation produced"
    );
    Ok(serde_json::to_value(ExecutionOutput {
      translation: translated.join("\n\n"),
      method: self.translator.method().to_string(),
      segments: chunks.len(),
    })?)
  }
}
