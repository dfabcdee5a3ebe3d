#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lector_engine::{StepRegistry, StepWorker, WorkerError};
use lector_state::{RunState, Step};
use lector_store::{Error as StoreError, RunStore, RunSummary};
use serde_json::{Value, json};

/// Returns the same payload every time.
pub struct Fixed(pub Value);

#[async_trait]
impl StepWorker for Fixed {
  async fn execute(&self, _state: &mut RunState) -> Result<Value, WorkerError> {
    Ok(self.0.clone())
  }
}

/// Pops one scripted payload per call, repeating the last one when the
/// script runs out.
pub struct Scripted {
  script: Mutex<VecDeque<Value>>,
  last: Mutex<Value>,
}

impl Scripted {
  pub fn new(script: Vec<Value>) -> Self {
    let last = script.last().cloned().unwrap_or_else(|| json!({}));
    Self {
      script: Mutex::new(script.into()),
      last: Mutex::new(last),
    }
  }

  pub fn qa(statuses: &[&str]) -> Self {
    Self::new(
      statuses
        .iter()
        .map(|s| json!({"status": s, "score": 100.0}))
        .collect(),
    )
  }

  pub fn judge(actions: &[(&str, f64)]) -> Self {
    Self::new(
      actions
        .iter()
        .map(|(a, score)| json!({"action": a, "score": score}))
        .collect(),
    )
  }
}

#[async_trait]
impl StepWorker for Scripted {
  async fn execute(&self, _state: &mut RunState) -> Result<Value, WorkerError> {
    let next = self.script.lock().unwrap().pop_front();
    Ok(next.unwrap_or_else(|| self.last.lock().unwrap().clone()))
  }
}

pub struct Failing(pub &'static str);

#[async_trait]
impl StepWorker for Failing {
  async fn execute(&self, _state: &mut RunState) -> Result<Value, WorkerError> {
    Err(WorkerError::failed(self.0))
  }
}

pub struct Slow(pub Duration);

#[async_trait]
impl StepWorker for Slow {
  async fn execute(&self, _state: &mut RunState) -> Result<Value, WorkerError> {
    tokio::time::sleep(self.0).await;
    Ok(json!({"validated": true}))
  }
}

/// Builds a small envelope from the record, the way a real delivery step does.
pub struct Envelope;

#[async_trait]
impl StepWorker for Envelope {
  async fn execute(&self, state: &mut RunState) -> Result<Value, WorkerError> {
    Ok(json!({
      "run_id": state.run_id,
      "status": state.run_status,
      "translated_text": state.translation_output,
      "metadata": {"document_type": state.inputs.document_type}
    }))
  }
}

pub fn planner(requires_approval: bool, reason: Option<&str>) -> Arc<dyn StepWorker> {
  let mut plan = json!({"requires_approval": requires_approval, "plan": ["translate"]});
  if let Some(reason) = reason {
    plan["approval_reason"] = json!(reason);
  }
  Arc::new(Fixed(plan))
}

/// A registry where every step succeeds and quality is clean.
pub fn clean_registry() -> StepRegistry {
  StepRegistry::builder()
    .register(Step::Intake, Arc::new(Fixed(json!({"validated": true}))))
    .register(Step::Planner, planner(false, None))
    .register(
      Step::Execution,
      Arc::new(Fixed(
        json!({"translation": "[es] texto", "method": "single_pass", "segments": 1}),
      )),
    )
    .register(Step::Qa, Arc::new(Scripted::qa(&["pass"])))
    .register(Step::Judge, Arc::new(Scripted::judge(&[("accept", 95.0)])))
    .register(Step::Delivery, Arc::new(Envelope))
    .build()
    .unwrap()
}

pub fn with(registry: StepRegistry, step: Step, worker: Arc<dyn StepWorker>) -> StepRegistry {
  registry.with_worker(step, worker).unwrap()
}

/// A store whose writes always fail.
pub struct BrokenStore;

#[async_trait]
impl RunStore for BrokenStore {
  async fn save(&self, _state: &RunState) -> Result<(), StoreError> {
    Err(StoreError::Io(std::io::Error::other("disk full")))
  }

  async fn load(&self, run_id: &str) -> Result<RunState, StoreError> {
    Err(StoreError::NotFound(run_id.to_string()))
  }

  async fn list(&self) -> Result<Vec<RunSummary>, StoreError> {
    Ok(Vec::new())
  }
}
