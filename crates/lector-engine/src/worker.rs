//! Step workers and the registry that binds them to pipeline steps.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use lector_state::{RunState, Step};

use crate::error::{EngineError, WorkerError};

/// A unit of pipeline work bound to one step.
///
/// Workers read the run record and return their output as a JSON object.
/// They may record warnings or errors on the record directly; everything
/// else about the record is owned by the supervisor.
#[async_trait]
pub trait StepWorker: Send + Sync {
  async fn execute(&self, state: &mut RunState) -> Result<serde_json::Value, WorkerError>;
}

/// Fixed mapping from each worker step to its implementation.
///
/// Resolved once at construction; `pause_for_approval` and `end` never map
/// to a worker.
#[derive(Clone)]
pub struct StepRegistry {
  workers: BTreeMap<Step, Arc<dyn StepWorker>>,
}

impl std::fmt::Debug for StepRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepRegistry")
      .field("steps", &self.workers.keys().collect::<Vec<_>>())
      .finish()
  }
}

impl StepRegistry {
  pub fn builder() -> StepRegistryBuilder {
    StepRegistryBuilder::default()
  }

  pub fn get(&self, step: Step) -> Option<&Arc<dyn StepWorker>> {
    self.workers.get(&step)
  }

  /// Return a copy of this registry with one step's worker swapped out.
  pub fn with_worker(
    &self,
    step: Step,
    worker: Arc<dyn StepWorker>,
  ) -> Result<Self, EngineError> {
    if !step.has_worker() {
      return Err(EngineError::NoWorker(step));
    }
    let mut workers = self.workers.clone();
    workers.insert(step, worker);
    Ok(Self { workers })
  }
}

/// Builder for [`StepRegistry`]. Every worker step must be registered.
#[derive(Default)]
pub struct StepRegistryBuilder {
  workers: BTreeMap<Step, Arc<dyn StepWorker>>,
}

impl StepRegistryBuilder {
  pub fn register(mut self, step: Step, worker: Arc<dyn StepWorker>) -> Self {
    self.workers.insert(step, worker);
    self
  }

  pub fn build(self) -> Result<StepRegistry, EngineError> {
    if let Some(step) = self.workers.keys().find(|s| !s.has_worker()) {
      return Err(EngineError::NoWorker(*step));
    }
    if let Some(step) = Step::WORKERS
      .iter()
      .find(|s| !self.workers.contains_key(*s))
    {
      return Err(EngineError::MissingWorker(*step));
    }
    Ok(StepRegistry {
      workers: self.workers,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  struct Fixed;

  #[async_trait]
  impl StepWorker for Fixed {
    async fn execute(&self, _state: &mut RunState) -> Result<serde_json::Value, WorkerError> {
      Ok(json!({}))
    }
  }

  fn full_builder() -> StepRegistryBuilder {
    Step::WORKERS
      .iter()
      .fold(StepRegistry::builder(), |b, step| {
        b.register(*step, Arc::new(Fixed))
      })
  }

  #[test]
  fn test_build_requires_every_worker_step() {
    let err = StepRegistry::builder()
      .register(Step::Intake, Arc::new(Fixed))
      .build()
      .unwrap_err();
    assert!(matches!(err, EngineError::MissingWorker(Step::Planner)));

    let registry = full_builder().build().unwrap();
    for step in Step::WORKERS {
      assert!(registry.get(step).is_some());
    }
    assert!(registry.get(Step::PauseForApproval).is_none());
    assert!(registry.get(Step::End).is_none());
  }

  #[test]
  fn test_control_points_cannot_hold_workers() {
    let err = full_builder()
      .register(Step::End, Arc::new(Fixed))
      .build()
      .unwrap_err();
    assert!(matches!(err, EngineError::NoWorker(Step::End)));

    let registry = full_builder().build().unwrap();
    assert!(
      registry
        .with_worker(Step::PauseForApproval, Arc::new(Fixed))
        .is_err()
    );
    assert!(registry.with_worker(Step::Qa, Arc::new(Fixed)).is_ok());
  }
}
