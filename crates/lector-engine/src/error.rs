//! Engine and worker errors.

use lector_state::{Status, Step};

/// Errors a step worker can report.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
  /// The request failed validation. Each entry is one problem.
  #[error("{}", .0.join("; "))]
  Validation(Vec<String>),

  /// The worker could not produce a result.
  #[error("{message}")]
  Failed { message: String },

  /// The worker produced a result that is not a JSON object.
  #[error("invalid worker output: {message}")]
  InvalidOutput { message: String },

  /// The worker's typed result could not be encoded.
  #[error("failed to encode worker output: {0}")]
  Encode(#[from] serde_json::Error),
}

impl WorkerError {
  pub fn failed(message: impl Into<String>) -> Self {
    Self::Failed {
      message: message.into(),
    }
  }
}

/// Errors that end or reject an orchestration call.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  /// A step worker failed. Fatal to the run.
  #[error("step '{step}' failed: {source}")]
  Worker {
    step: Step,
    #[source]
    source: WorkerError,
  },

  /// A step with no worker behind it was scheduled for execution.
  #[error("no worker registered for step '{0}'")]
  NoWorker(Step),

  /// The registry was built without a worker for a pipeline step.
  #[error("missing worker for step '{0}'")]
  MissingWorker(Step),

  /// Resume was called on a run that is not paused.
  #[error("run '{run_id}' is not paused (status: {status})")]
  NotPaused { run_id: String, status: Status },

  /// The approval gate was denied on resume.
  #[error("Approval denied")]
  ApprovalDenied,

  /// Loading a run from the store failed.
  #[error("store error: {0}")]
  Store(#[from] lector_store::Error),
}

impl EngineError {
  /// Message recorded in the run's error set when this error ends a run.
  ///
  /// Worker failures record the worker's own message so that validation
  /// problems surface verbatim.
  pub fn run_message(&self) -> String {
    match self {
      EngineError::Worker { source, .. } => source.to_string(),
      other => other.to_string(),
    }
  }
}
