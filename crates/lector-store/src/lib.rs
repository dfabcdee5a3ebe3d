//! Lector Store
//!
//! This crate provides the persistence trait and implementations for run
//! records. Each run is stored as one JSON snapshot of its [`RunState`],
//! keyed by `run_id` and overwritten on every save.
//!
//! Persistence is a best-effort snapshot for recovery and inspection, not a
//! transactional log. Runs never share records, so implementations need no
//! cross-run coordination.
//!
//! Implementations:
//! - [`FsStore`] writes `{base_path}/{run_id}.json`
//! - [`SqliteStore`] upserts into a `runs` table

mod fs;
mod sqlite;

pub use fs::FsStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use lector_state::{RunState, RunStatus, Status};
use serde::{Deserialize, Serialize};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The requested run was not found.
  #[error("run not found: {0}")]
  NotFound(String),

  /// An I/O error occurred.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// The record could not be encoded or decoded.
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  /// Applying the schema failed.
  #[error("migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),
}

/// Listing entry for a stored run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
  pub run_id: String,
  pub status: Status,
  pub run_status: Option<RunStatus>,
}

impl From<&RunState> for RunSummary {
  fn from(state: &RunState) -> Self {
    Self {
      run_id: state.run_id.clone(),
      status: state.status,
      run_status: state.run_status,
    }
  }
}

/// Storage trait for run records.
#[async_trait]
pub trait RunStore: Send + Sync {
  /// Write (or overwrite) the snapshot for `state.run_id`.
  async fn save(&self, state: &RunState) -> Result<(), Error>;

  /// Read a run back by ID.
  async fn load(&self, run_id: &str) -> Result<RunState, Error>;

  /// List stored runs.
  async fn list(&self) -> Result<Vec<RunSummary>, Error>;
}
