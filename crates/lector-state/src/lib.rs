//! Lector State
//!
//! This crate provides the run record for lector. A [`RunState`] is the single
//! aggregate describing one translation run: its identity and inputs, the
//! route it has taken, per-step statuses and timings, step results,
//! accumulated warnings and errors, and its terminal status.
//!
//! The supervisor in `lector-engine` owns the record for the duration of a
//! run and lends it by `&mut` to whichever step is active. Persistence and
//! progress observers only ever see it by shared reference or as a
//! [`ProgressSnapshot`].

mod event;
mod messages;
mod snapshot;
mod state;
mod status;
mod step;

pub use event::{EventLevel, EventStatus, RunEvent};
pub use messages::MessageSet;
pub use snapshot::ProgressSnapshot;
pub use state::{RunInputs, RunState};
pub use status::{Approval, RunStatus, Status};
pub use step::{Step, StepStatus};
