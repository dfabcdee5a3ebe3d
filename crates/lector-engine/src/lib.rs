//! Lector Engine
//!
//! This crate provides the orchestration engine for lector: the supervisor
//! loop that drives a translation run through its fixed pipeline, the router
//! that decides each next step, and the bookkeeping that turns a run into an
//! auditable record.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Supervisor                           │
//! │  - run(request) / orchestrate(state) → RunState             │
//! │  - resume(state, decision) after an approval pause          │
//! │  - retry gate, deadline warnings, terminal status           │
//! └─────────────────────────────────────────────────────────────┘
//!        │                │                 │              │
//!        ▼                ▼                 ▼              ▼
//!   router::next_step  StepRegistry    dyn RunStore   ProgressNotifier
//!   (pure routing)     (StepWorker     (snapshot per  (event, snapshot)
//!                       per step)       step)          sink
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use lector_engine::{StepRegistry, Supervisor, SupervisorConfig};
//!
//! let registry = StepRegistry::builder()
//!     .register(Step::Intake, intake)
//!     // ... one worker per pipeline step
//!     .build()?;
//! let supervisor = Supervisor::new(registry, store, SupervisorConfig::default());
//!
//! let state = supervisor.run(request).await;
//! println!("{}", RunResponse::from_state(&state).to_json_pretty()?);
//! ```

mod deadline;
mod error;
mod events;
mod merge;
mod response;
pub mod router;
mod supervisor;
mod worker;

pub use deadline::DeadlineMonitor;
pub use error::{EngineError, WorkerError};
pub use events::{
  ChannelNotifier, EventWindow, NoopNotifier, ProgressNotifier, ProgressUpdate, TracingNotifier,
};
pub use merge::MOCK_METHOD;
pub use response::{FailedResponse, PausedResponse, RunResponse};
pub use supervisor::{ApprovalDecision, Supervisor, SupervisorConfig};
pub use worker::{StepRegistry, StepRegistryBuilder, StepWorker};

pub use lector_state::{RunState, Step};
