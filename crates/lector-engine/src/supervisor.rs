//! The supervisor loop.
//!
//! The `Supervisor` drives one run at a time through the pipeline: it asks
//! the router for the next step, executes the step's worker, merges the
//! output, persists a snapshot, and emits progress events. Failures anywhere
//! in the loop are caught once at the outer boundary, so callers always get
//! a record back.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use lector_config::{Settings, TranslationRequest};
use lector_state::{
  Approval, EventStatus, RunEvent, RunState, RunStatus, Status, Step, StepStatus,
};
use lector_store::RunStore;
use tracing::{error, info, instrument, warn};

use crate::deadline::DeadlineMonitor;
use crate::error::{EngineError, WorkerError};
use crate::events::{NoopNotifier, ProgressNotifier};
use crate::merge::merge_result;
use crate::response::refresh_final_output;
use crate::router;
use crate::worker::StepRegistry;

pub(crate) const DEFAULT_PAUSE_REASON: &str = "Awaiting human approval";
pub(crate) const SLA_WARNING: &str = "SLA threshold exceeded";

/// Configuration for the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorConfig {
  /// Pass the approval gate without pausing.
  pub auto_approve: bool,
  /// Budget of active time per run, excluding time paused at the approval
  /// gate. Breaching it only adds a warning.
  pub sla: Duration,
}

impl Default for SupervisorConfig {
  fn default() -> Self {
    Self {
      auto_approve: true,
      sla: Duration::from_secs(120),
    }
  }
}

impl From<&Settings> for SupervisorConfig {
  fn from(settings: &Settings) -> Self {
    Self {
      auto_approve: settings.auto_approve,
      sla: settings.sla(),
    }
  }
}

/// Decision supplied when resuming a paused run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
  Grant,
  Deny,
}

/// How the guarded part of a run ended without error.
enum Outcome {
  Paused,
  Finished,
}

/// The orchestration engine.
///
/// Generic over `N: ProgressNotifier` to allow different observation
/// strategies. Use `Supervisor::new()` for no-op notifications, or
/// `Supervisor::with_notifier()` to provide one.
pub struct Supervisor<N: ProgressNotifier = NoopNotifier> {
  registry: StepRegistry,
  store: Arc<dyn RunStore>,
  notifier: N,
  deadline: DeadlineMonitor,
  auto_approve: bool,
}

impl Supervisor<NoopNotifier> {
  /// Create a supervisor that discards progress events.
  pub fn new(registry: StepRegistry, store: Arc<dyn RunStore>, config: SupervisorConfig) -> Self {
    Self::with_notifier(registry, store, config, NoopNotifier)
  }
}

impl<N: ProgressNotifier> Supervisor<N> {
  pub fn with_notifier(
    registry: StepRegistry,
    store: Arc<dyn RunStore>,
    config: SupervisorConfig,
    notifier: N,
  ) -> Self {
    Self {
      registry,
      store,
      notifier,
      deadline: DeadlineMonitor::new(config.sla),
      auto_approve: config.auto_approve,
    }
  }

  pub fn store(&self) -> &Arc<dyn RunStore> {
    &self.store
  }

  /// Create a record for `request` and orchestrate it.
  pub async fn run(&self, request: TranslationRequest) -> RunState {
    self.orchestrate(RunState::new(request)).await
  }

  /// Drive a fresh record through the pipeline.
  ///
  /// Returns the record paused at the approval gate, completed, or failed.
  #[instrument(
    name = "supervisor_orchestrate",
    skip(self, state),
    fields(run_id = %state.run_id)
  )]
  pub async fn orchestrate(&self, mut state: RunState) -> RunState {
    let outcome = self.start(&mut state).await;
    self.conclude(&mut state, outcome).await;
    state
  }

  /// Continue a paused run with an approval decision.
  #[instrument(
    name = "supervisor_resume",
    skip(self, state),
    fields(run_id = %state.run_id)
  )]
  pub async fn resume(
    &self,
    mut state: RunState,
    decision: ApprovalDecision,
  ) -> Result<RunState, EngineError> {
    if !state.is_paused() {
      return Err(EngineError::NotPaused {
        run_id: state.run_id.clone(),
        status: state.status,
      });
    }

    let outcome = match decision {
      ApprovalDecision::Grant => {
        state.mark_resumed(Utc::now());
        state.approval_granted = Approval::Granted;
        state.pause_reason = None;
        state.status = Status::InProgress;
        state.run_status = None;
        self.emit(
          &mut state,
          RunEvent::info("approval", EventStatus::Approved, "Approval granted."),
        );
        self.persist(&state).await;
        info!("approval_granted");
        self
          .drive(&mut state, Step::Execution, Some(Step::Planner))
          .await
      }
      ApprovalDecision::Deny => {
        state.mark_resumed(Utc::now());
        state.approval_granted = Approval::Denied;
        state.pause_reason = None;
        self.emit(
          &mut state,
          RunEvent::warning("approval", EventStatus::Denied, "Approval denied."),
        );
        info!("approval_denied");
        Err(EngineError::ApprovalDenied)
      }
    };

    self.conclude(&mut state, outcome).await;
    Ok(state)
  }

  /// Load a paused run from the store and resume it.
  pub async fn resume_run(
    &self,
    run_id: &str,
    decision: ApprovalDecision,
  ) -> Result<RunState, EngineError> {
    let state = self.store.load(run_id).await?;
    self.resume(state, decision).await
  }

  async fn start(&self, state: &mut RunState) -> Result<Outcome, EngineError> {
    state.status = Status::InProgress;
    state.run_status = None;
    state.step_status = RunState::pending_steps();
    state.start_time = Some(Utc::now());
    self.persist(state).await;

    info!(
      run_id = %state.run_id,
      source_language = %state.inputs.source_language,
      target_language = %state.inputs.target_language,
      document_type = %state.inputs.document_type,
      "workflow_started"
    );
    self.emit(
      state,
      RunEvent::info("workflow", EventStatus::Started, "Workflow started."),
    );

    self.drive(state, Step::Intake, None).await
  }

  /// Run the routing loop from `current` until the run pauses or finishes.
  async fn drive(
    &self,
    state: &mut RunState,
    mut current: Step,
    mut previous: Option<Step>,
  ) -> Result<Outcome, EngineError> {
    while !matches!(current, Step::End | Step::Delivery) {
      if current == Step::PauseForApproval {
        if self.auto_approve {
          state.approval_granted = Approval::Granted;
          state.pause_reason = None;
          self.emit(
            state,
            RunEvent::info(
              "approval",
              EventStatus::AutoApproved,
              "Approval gate auto-approved by configuration.",
            ),
          );
          current = Step::Execution;
          continue;
        }

        let reason = state
          .approval_reason()
          .unwrap_or(DEFAULT_PAUSE_REASON)
          .to_string();
        state.status = Status::Paused;
        state.run_status = Some(RunStatus::Paused);
        state.pause_reason = Some(reason.clone());
        state.paused_at = Some(Utc::now());
        self.emit(
          state,
          RunEvent::warning("approval", EventStatus::Paused, reason.clone()),
        );
        self.persist(state).await;
        info!(run_id = %state.run_id, pause_reason = %reason, "workflow_paused");
        return Ok(Outcome::Paused);
      }

      if current == Step::Execution
        && let Some(finished) = previous
        && router::retry_eligible(finished, state)
      {
        state.retry_count += 1;
        let message = format!("Retrying translation, attempt {}", state.retry_count);
        state.add_warning(message.clone());
        self.emit(
          state,
          RunEvent::warning("execution", EventStatus::Retry, message),
        );
        info!(
          run_id = %state.run_id,
          retry_count = state.retry_count,
          after = %finished,
          "translation_retry"
        );
      }

      state.route_history.push(current);
      self.execute_step(current, state).await?;
      self.persist(state).await;
      self.check_deadline(state);

      previous = Some(current);
      current = router::next_step(current, state);
    }

    if current == Step::Delivery {
      state.route_history.push(Step::Delivery);
      state.status = Status::Completed;
      state.end_time = Some(Utc::now());
      state.run_status = Some(state.derive_run_status());
      self.execute_step(Step::Delivery, state).await?;
      refresh_final_output(state);
      self.persist(state).await;
    }

    self.finalize(state).await;
    Ok(Outcome::Finished)
  }

  /// Execute one worker step and merge its output.
  #[instrument(
    name = "step_execute",
    skip(self, state),
    fields(run_id = %state.run_id, step = %step)
  )]
  async fn execute_step(&self, step: Step, state: &mut RunState) -> Result<(), EngineError> {
    let worker = self.registry.get(step).ok_or(EngineError::NoWorker(step))?;

    state.current_step = Some(step);
    state.set_step_status(step, StepStatus::InProgress);
    self.emit(
      state,
      RunEvent::info(step.as_str(), EventStatus::InProgress, format!("{step} started.")),
    );

    let started = Instant::now();
    let result = worker.execute(state).await.and_then(|output| {
      if output.is_object() {
        Ok(output)
      } else {
        Err(WorkerError::InvalidOutput {
          message: format!("expected a JSON object, got {output}"),
        })
      }
    });

    match result {
      Ok(output) => {
        let elapsed = started.elapsed().as_secs_f64();
        state.agent_timings.insert(step, elapsed);
        merge_result(state, step, output);
        state.set_step_status(step, StepStatus::Completed);
        self.emit(
          state,
          RunEvent::info(
            step.as_str(),
            EventStatus::Completed,
            format!("{step} completed in {elapsed:.2}s."),
          ),
        );
        info!(elapsed_seconds = elapsed, "step_completed");
        Ok(())
      }
      Err(e) => {
        state.set_step_status(step, StepStatus::Failed);
        self.emit(
          state,
          RunEvent::error(step.as_str(), EventStatus::Failed, e.to_string()),
        );
        error!(error = %e, "step_failed");
        Err(EngineError::Worker { step, source: e })
      }
    }
  }

  fn check_deadline(&self, state: &mut RunState) {
    if state.warnings.contains(SLA_WARNING) || !self.deadline.is_breached(state.active_start()) {
      return;
    }
    state.add_warning(SLA_WARNING);
    self.emit(
      state,
      RunEvent::warning("workflow", EventStatus::SlaWarning, SLA_WARNING),
    );
    warn!(
      run_id = %state.run_id,
      budget_seconds = self.deadline.budget().as_secs(),
      "sla_exceeded"
    );
  }

  async fn finalize(&self, state: &mut RunState) {
    state.status = Status::Completed;
    if state.end_time.is_none() {
      state.end_time = Some(Utc::now());
    }
    let run_status = state.derive_run_status();
    state.run_status = Some(run_status);
    self.emit(
      state,
      RunEvent::info(
        "workflow",
        run_status.into(),
        format!("Workflow finished with status: {run_status}"),
      ),
    );
    refresh_final_output(state);
    self.persist(state).await;
    info!(run_id = %state.run_id, run_status = %run_status, "workflow_completed");
  }

  async fn conclude(&self, state: &mut RunState, outcome: Result<Outcome, EngineError>) {
    match outcome {
      Ok(Outcome::Paused) | Ok(Outcome::Finished) => {}
      Err(e) => self.fail(state, e).await,
    }
  }

  /// Outer failure boundary.
  async fn fail(&self, state: &mut RunState, err: EngineError) {
    let message = err.run_message();
    let step = match &err {
      EngineError::Worker { step, .. } => step.to_string(),
      EngineError::ApprovalDenied => "approval".to_string(),
      _ => state
        .current_step
        .map(|s| s.to_string())
        .unwrap_or_else(|| "workflow".to_string()),
    };

    state.status = Status::Failed;
    state.end_time = Some(Utc::now());
    state.run_status = Some(RunStatus::Failed);
    state.add_error(message.clone());
    self.emit(
      state,
      RunEvent::error(step, EventStatus::Failed, message),
    );
    self.persist(state).await;
    error!(run_id = %state.run_id, error = %err, "workflow_failed");
  }

  /// Append an event and hand it to the notifier with a fresh snapshot.
  fn emit(&self, state: &mut RunState, event: RunEvent) {
    state.record_event(event);
    if let Some(event) = state.events.last() {
      self.notifier.notify(event, &state.snapshot());
    }
  }

  /// Best-effort snapshot; a failed save never fails the run.
  async fn persist(&self, state: &RunState) {
    if let Err(e) = self.store.save(state).await {
      warn!(run_id = %state.run_id, error = %e, "failed to persist run snapshot");
    }
  }
}
