//! Lector Workers
//!
//! Default [`StepWorker`] implementations for every pipeline step:
//!
//! - [`IntakeWorker`] validates and normalizes the request
//! - [`PlannerWorker`] picks a strategy and flags long jobs for approval
//! - [`ExecutionWorker`] translates blank-line separated chunks through a
//!   [`Translator`], concurrently when asked to. [`select_translator`] picks
//!   [`GeminiTranslator`] or the offline [`DictionaryTranslator`] from
//!   settings.
//! - [`QaWorker`] runs rule-based quality checks
//! - [`JudgeWorker`] scores fidelity and recommends accept, retry or review
//! - [`DeliveryWorker`] assembles the final envelope

mod check;
mod delivery;
mod execution;
mod gemini;
mod intake;
mod judge;
mod planner;
mod qa;
mod translator;

use std::sync::Arc;

use lector_config::Settings;
use lector_engine::{EngineError, StepRegistry, StepWorker};
use lector_state::Step;
use tracing::warn;

pub use check::Check;
pub use delivery::{DeliveryEnvelope, DeliveryMetadata, DeliveryWorker};
pub use execution::{ExecutionOutput, ExecutionWorker};
pub use gemini::{GEMINI_METHOD, GeminiTranslator};
pub use intake::{Complexity, IntakeReport, IntakeWorker};
pub use judge::{JudgeAction, JudgeReport, JudgeWorker};
pub use planner::{APPROVAL_REASON, Plan, PlannerWorker};
pub use qa::{QaReport, QaStatus, QaWorker};
pub use translator::{DictionaryTranslator, TranslateError, Translator};

pub const MISSING_KEY_WARNING: &str =
  "USE_REAL_LLM enabled but GOOGLE_API_KEY missing. Falling back to mock translation.";

/// The translator chosen for a run, plus any warning raised while choosing.
pub struct TranslatorChoice {
  pub translator: Arc<dyn Translator>,
  pub warning: Option<String>,
}

/// Pick the translation backend the settings ask for.
///
/// A real model needs an API key; without one the offline translator is
/// used and the choice carries [`MISSING_KEY_WARNING`].
pub fn select_translator(settings: &Settings) -> TranslatorChoice {
  if !settings.use_real_llm {
    return TranslatorChoice {
      translator: Arc::new(DictionaryTranslator),
      warning: None,
    };
  }

  match settings.api_key() {
    Some(key) => TranslatorChoice {
      translator: Arc::new(GeminiTranslator::new(key, settings.gemini_model.clone())),
      warning: None,
    },
    None => {
      warn!("{MISSING_KEY_WARNING}");
      TranslatorChoice {
        translator: Arc::new(DictionaryTranslator),
        warning: Some(MISSING_KEY_WARNING.to_string()),
      }
    }
  }
}

/// Registry wired with the default workers and the given translator.
pub fn registry_with_translator(
  translator: Arc<dyn Translator>,
) -> Result<StepRegistry, EngineError> {
  let workers: [(Step, Arc<dyn StepWorker>); 6] = [
    (Step::Intake, Arc::new(IntakeWorker)),
    (Step::Planner, Arc::new(PlannerWorker)),
    (Step::Execution, Arc::new(ExecutionWorker::new(translator))),
    (Step::Qa, Arc::new(QaWorker)),
    (Step::Judge, Arc::new(JudgeWorker)),
    (Step::Delivery, Arc::new(DeliveryWorker)),
  ];
  workers
    .into_iter()
    .fold(StepRegistry::builder(), |builder, (step, worker)| {
      builder.register(step, worker)
    })
    .build()
}

/// Registry wired with the default workers and the offline dictionary
/// translator.
pub fn default_registry() -> Result<StepRegistry, EngineError> {
  registry_with_translator(Arc::new(DictionaryTranslator))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_mock_translator_by_default() {
    let choice = select_translator(&Settings::default());
    assert_eq!(choice.translator.method(), "mock");
    assert_eq!(choice.warning, None);
  }

  #[test]
  fn test_real_llm_without_key_falls_back_with_warning() {
    let settings = Settings {
      use_real_llm: true,
      ..Settings::default()
    };

    let choice = select_translator(&settings);
    assert_eq!(choice.translator.method(), "mock");
    assert_eq!(choice.warning.as_deref(), Some(MISSING_KEY_WARNING));
  }

  #[test]
  fn test_real_llm_with_key_uses_gemini() {
    let settings = Settings {
      use_real_llm: true,
      google_api_key: Some("key".to_string()),
      ..Settings::default()
    };

    let choice = select_translator(&settings);
    assert_eq!(choice.translator.method(), GEMINI_METHOD);
    assert_eq!(choice.warning, None);
  }
}
