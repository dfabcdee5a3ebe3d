//! Integration tests for SqliteStore against an in-memory database.

use lector_config::TranslationRequest;
use lector_state::{RunState, RunStatus, Status};
use lector_store::{Error, RunStore, SqliteStore};
use sqlx::sqlite::SqlitePoolOptions;

async fn memory_store() -> SqliteStore {
  // a single connection keeps every query on the same in-memory database
  let pool = SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("failed to open in-memory sqlite");
  let store = SqliteStore::new(pool);
  store.migrate().await.expect("migrations failed");
  store
}

fn sample_state() -> RunState {
  RunState::new(TranslationRequest::new("en", "es", "Payment terms apply."))
}

#[tokio::test]
async fn test_save_then_load_round_trips_record() {
  let store = memory_store().await;
  let mut state = sample_state();
  state.status = Status::Paused;
  state.pause_reason = Some("Awaiting human approval".to_string());
  state.run_status = Some(RunStatus::Paused);

  store.save(&state).await.unwrap();

  let loaded = store.load(&state.run_id).await.unwrap();
  assert_eq!(loaded, state);
}

#[tokio::test]
async fn test_save_upserts_by_run_id() {
  let store = memory_store().await;
  let mut state = sample_state();
  store.save(&state).await.unwrap();

  state.status = Status::Completed;
  state.run_status = Some(RunStatus::CompletedWithWarnings);
  store.save(&state).await.unwrap();

  let runs = store.list().await.unwrap();
  assert_eq!(runs.len(), 1);
  assert_eq!(runs[0].run_id, state.run_id);
  assert_eq!(runs[0].status, Status::Completed);
  assert_eq!(runs[0].run_status, Some(RunStatus::CompletedWithWarnings));
}

#[tokio::test]
async fn test_load_missing_run_is_not_found() {
  let store = memory_store().await;

  let err = store.load("missing").await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_pending_run_lists_without_run_status() {
  let store = memory_store().await;
  let state = sample_state();
  store.save(&state).await.unwrap();

  let runs = store.list().await.unwrap();
  assert_eq!(runs[0].status, Status::Pending);
  assert_eq!(runs[0].run_status, None);
}

#[tokio::test]
async fn test_open_creates_database_file() {
  let dir = tempfile::TempDir::new().unwrap();
  let path = dir.path().join("runs.db");

  let store = SqliteStore::open(&path).await.unwrap();
  let state = sample_state();
  store.save(&state).await.unwrap();

  assert!(path.exists());
  let reopened = SqliteStore::open(&path).await.unwrap();
  assert_eq!(reopened.load(&state.run_id).await.unwrap().run_id, state.run_id);
}
