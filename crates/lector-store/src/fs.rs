use std::path::PathBuf;

use async_trait::async_trait;
use lector_state::RunState;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::{Error, RunStore, RunSummary};

/// Filesystem-based run store.
///
/// Stores each run as pretty-printed JSON at `{base_path}/{run_id}.json`.
/// The directory is created on first save. Writes go to a sibling temp file
/// that is renamed over the target, so a reader never sees a half-written
/// record.
pub struct FsStore {
  base_path: PathBuf,
}

impl FsStore {
  /// Create a new filesystem store with the given base path.
  pub fn new(base_path: impl Into<PathBuf>) -> Self {
    Self {
      base_path: base_path.into(),
    }
  }

  fn run_path(&self, run_id: &str) -> Result<PathBuf, Error> {
    // run ids are used as file names; refuse anything that could escape the directory
    if run_id.is_empty() || run_id.contains(['/', '\\']) || run_id.contains("..") {
      return Err(Error::NotFound(run_id.to_string()));
    }
    Ok(self.base_path.join(format!("{}.json", run_id)))
  }
}

#[async_trait]
impl RunStore for FsStore {
  async fn save(&self, state: &RunState) -> Result<(), Error> {
    let path = self.run_path(&state.run_id)?;
    fs::create_dir_all(&self.base_path).await?;

    let data = serde_json::to_vec_pretty(state)?;
    let tmp_path = path.with_extension("json.tmp");

    let mut file = fs::File::create(&tmp_path).await?;
    file.write_all(&data).await?;
    file.flush().await?;
    drop(file);

    fs::rename(&tmp_path, &path).await?;
    Ok(())
  }

  async fn load(&self, run_id: &str) -> Result<RunState, Error> {
    let path = self.run_path(run_id)?;
    let data = fs::read(&path).await.map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        Error::NotFound(run_id.to_string())
      } else {
        Error::Io(e)
      }
    })?;
    Ok(serde_json::from_slice(&data)?)
  }

  async fn list(&self) -> Result<Vec<RunSummary>, Error> {
    let mut entries = match fs::read_dir(&self.base_path).await {
      Ok(entries) => entries,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(Error::Io(e)),
    };

    let mut runs: Vec<(chrono::DateTime<chrono::Utc>, RunSummary)> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
      let path = entry.path();
      if path.extension().and_then(|e| e.to_str()) != Some("json") {
        continue;
      }

      let data = fs::read(&path).await?;
      match serde_json::from_slice::<RunState>(&data) {
        Ok(state) => runs.push((state.created_at, RunSummary::from(&state))),
        Err(e) => {
          warn!(path = %path.display(), error = %e, "skipping unreadable run record");
        }
      }
    }

    // newest first
    runs.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(runs.into_iter().map(|(_, summary)| summary).collect())
  }
}
