use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use lector_state::{RunState, RunStatus, Status};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};

use crate::{Error, RunStore, RunSummary};

/// SQLite-based run store.
///
/// One row per run: the full record as JSON plus the status columns needed
/// for listing without decoding every snapshot.
pub struct SqliteStore {
  pool: SqlitePool,
}

#[derive(FromRow)]
struct SummaryRow {
  run_id: String,
  status: String,
  run_status: Option<String>,
}

impl SqliteStore {
  /// Create a new SQLite store with the given connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Open (creating if needed) a database file and apply migrations.
  pub async fn open(path: &Path) -> Result<Self, Error> {
    let options = SqliteConnectOptions::new()
      .filename(path)
      .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    let store = Self::new(pool);
    store.migrate().await?;
    Ok(store)
  }

  /// Run database migrations.
  pub async fn migrate(&self) -> Result<(), Error> {
    sqlx::migrate!("../../migrations").run(&self.pool).await?;
    Ok(())
  }
}

fn parse_status<T: serde::de::DeserializeOwned>(value: String) -> Result<T, Error> {
  Ok(serde_json::from_value(serde_json::Value::String(value))?)
}

#[async_trait]
impl RunStore for SqliteStore {
  async fn save(&self, state: &RunState) -> Result<(), Error> {
    let snapshot = serde_json::to_string(state)?;

    sqlx::query(
      r#"
            INSERT INTO runs (run_id, status, run_status, snapshot, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(run_id) DO UPDATE SET
                status = excluded.status,
                run_status = excluded.run_status,
                snapshot = excluded.snapshot,
                updated_at = excluded.updated_at
            "#,
    )
    .bind(&state.run_id)
    .bind(state.status.as_str())
    .bind(state.run_status.map(|s| s.as_str()))
    .bind(snapshot)
    .bind(Utc::now())
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn load(&self, run_id: &str) -> Result<RunState, Error> {
    let row: Option<(String,)> = sqlx::query_as(
      r#"
            SELECT snapshot
            FROM runs
            WHERE run_id = ?
            "#,
    )
    .bind(run_id)
    .fetch_optional(&self.pool)
    .await?;

    let (snapshot,) = row.ok_or_else(|| Error::NotFound(run_id.to_string()))?;
    Ok(serde_json::from_str(&snapshot)?)
  }

  async fn list(&self) -> Result<Vec<RunSummary>, Error> {
    let rows: Vec<SummaryRow> = sqlx::query_as(
      r#"
            SELECT run_id, status, run_status
            FROM runs
            ORDER BY updated_at DESC
            "#,
    )
    .fetch_all(&self.pool)
    .await?;

    rows
      .into_iter()
      .map(|row| {
        Ok(RunSummary {
          run_id: row.run_id,
          status: parse_status::<Status>(row.status)?,
          run_status: row
            .run_status
            .map(parse_status::<RunStatus>)
            .transpose()?,
        })
      })
      .collect()
  }
}
