//! End-to-end checkpoint lifecycle tests against the in-memory store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use okrserver::config::{AppConfig, DatabaseConfig, ServerConfig};
use okrserver::goals::checkpoints::CheckpointEngine;
use okrserver::goals::types::{
    CheckpointStatus, CreateKeyResultRequest, ListObjectivesQuery, UpdateCheckpointRequest,
    UpdateKeyResultRequest,
};
use okrserver::goals::{create_key_result, update_key_result};
use okrserver::shared::error::OkrError;
use okrserver::shared::models::{ActionRecord, CheckpointRecord, KeyResultRecord, ObjectiveRecord};
use okrserver::shared::state::AppState;
use okrserver::storage::{DashboardCounts, MemoryStore, OkrStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn objective_record(id: Uuid) -> ObjectiveRecord {
    let now = Utc::now().naive_utc();
    ObjectiveRecord {
        id: id.to_string(),
        owner_id: Uuid::nil().to_string(),
        title: "Grow the business".to_string(),
        description: None,
        start_date: date(2024, 1, 1),
        end_date: date(2024, 12, 31),
        status: "active".to_string(),
        progress: 0.0,
        created_at: now,
        updated_at: now,
    }
}

fn key_result_record(
    id: Uuid,
    objective_id: Uuid,
    frequency: &str,
    start: NaiveDate,
    end: NaiveDate,
    initial: f64,
    target: f64,
) -> KeyResultRecord {
    let now = Utc::now().naive_utc();
    KeyResultRecord {
        id: id.to_string(),
        objective_id: objective_id.to_string(),
        title: "Sign new customers".to_string(),
        description: None,
        initial_value: initial,
        target_value: target,
        current_value: initial,
        unit: Some("customers".to_string()),
        frequency: frequency.to_string(),
        start_date: start,
        end_date: end,
        status: "active".to_string(),
        progress: 0.0,
        created_at: now,
        updated_at: now,
    }
}

fn app_state(store: Arc<dyn OkrStore>) -> Arc<AppState> {
    let config = AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 1,
        },
    };
    Arc::new(AppState::new(config, store))
}

async fn setup_key_result<S: OkrStore>(
    store: &Arc<S>,
    frequency: &str,
    start: NaiveDate,
    end: NaiveDate,
    initial: f64,
    target: f64,
) -> (Uuid, Uuid) {
    let objective_id = Uuid::new_v4();
    let kr_id = Uuid::new_v4();
    store
        .insert_objective(objective_record(objective_id))
        .await
        .unwrap();
    store
        .insert_key_result(key_result_record(
            kr_id,
            objective_id,
            frequency,
            start,
            end,
            initial,
            target,
        ))
        .await
        .unwrap();
    (objective_id, kr_id)
}

#[tokio::test]
async fn monthly_generation_produces_the_expected_schedule() {
    let store = Arc::new(MemoryStore::new());
    let engine = CheckpointEngine::new(store.clone());
    let (_, kr_id) = setup_key_result(
        &store,
        "monthly",
        date(2024, 1, 1),
        date(2024, 3, 31),
        0.0,
        300.0,
    )
    .await;

    let checkpoints = engine.generate_checkpoints(kr_id).await.unwrap();

    assert_eq!(checkpoints.len(), 3);
    let labels: Vec<&str> = checkpoints.iter().map(|c| c.period.as_str()).collect();
    assert_eq!(labels, vec!["2024-01", "2024-02", "2024-03"]);
    let targets: Vec<f64> = checkpoints.iter().map(|c| c.target_value).collect();
    assert_eq!(targets, vec![100.0, 200.0, 300.0]);
    for checkpoint in &checkpoints {
        assert!(checkpoint.actual_value.is_none());
        assert_eq!(checkpoint.status, CheckpointStatus::Pending);
        assert!(checkpoint.completed_at.is_none());
    }
}

#[tokio::test]
async fn same_day_range_gives_one_checkpoint_with_the_full_target() {
    let store = Arc::new(MemoryStore::new());
    let engine = CheckpointEngine::new(store.clone());
    let (_, kr_id) = setup_key_result(
        &store,
        "weekly",
        date(2024, 1, 1),
        date(2024, 1, 1),
        0.0,
        50.0,
    )
    .await;

    let checkpoints = engine.generate_checkpoints(kr_id).await.unwrap();

    assert_eq!(checkpoints.len(), 1);
    assert_eq!(checkpoints[0].target_value, 50.0);
}

#[tokio::test]
async fn regeneration_is_idempotent_but_discards_recorded_progress() {
    let store = Arc::new(MemoryStore::new());
    let engine = CheckpointEngine::new(store.clone());
    let (_, kr_id) = setup_key_result(
        &store,
        "monthly",
        date(2024, 1, 1),
        date(2024, 3, 31),
        0.0,
        300.0,
    )
    .await;

    let first = engine.generate_checkpoints(kr_id).await.unwrap();
    engine
        .update_checkpoint(
            first[0].id,
            UpdateCheckpointRequest {
                actual_value: 120.0,
                notes: Some("ahead of plan".to_string()),
            },
        )
        .await
        .unwrap();

    let second = engine.generate_checkpoints(kr_id).await.unwrap();

    let first_schedule: Vec<(&str, f64)> = first
        .iter()
        .map(|c| (c.period.as_str(), c.target_value))
        .collect();
    let second_schedule: Vec<(&str, f64)> = second
        .iter()
        .map(|c| (c.period.as_str(), c.target_value))
        .collect();
    assert_eq!(first_schedule, second_schedule);

    // The recorded actual value and notes are gone.
    for checkpoint in &second {
        assert!(checkpoint.actual_value.is_none());
        assert!(checkpoint.notes.is_none());
        assert_eq!(checkpoint.status, CheckpointStatus::Pending);
    }
    // And the store holds exactly the new set.
    assert_eq!(store.list_checkpoints(kr_id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn reaching_the_target_completes_the_checkpoint_and_rolls_up() {
    let store = Arc::new(MemoryStore::new());
    let engine = CheckpointEngine::new(store.clone());
    let (objective_id, kr_id) = setup_key_result(
        &store,
        "monthly",
        date(2024, 1, 1),
        date(2024, 3, 31),
        0.0,
        300.0,
    )
    .await;

    let checkpoints = engine.generate_checkpoints(kr_id).await.unwrap();
    let last = checkpoints.last().unwrap();

    let updated = engine
        .update_checkpoint(
            last.id,
            UpdateCheckpointRequest {
                actual_value: 300.0,
                notes: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, CheckpointStatus::Completed);
    assert!(updated.completed_at.is_some());

    // The key result absorbed the recorded value and the objective followed.
    let kr = store.get_key_result(kr_id).await.unwrap().unwrap();
    assert_eq!(kr.current_value, 300.0);
    assert_eq!(kr.progress, 100.0);
    let objective = store.get_objective(objective_id).await.unwrap().unwrap();
    assert_eq!(objective.progress, 100.0);
}

#[tokio::test]
async fn missed_checkpoints_split_between_at_risk_and_overdue() {
    let store = Arc::new(MemoryStore::new());
    let engine = CheckpointEngine::new(store.clone());
    // A 2024 range is long past due by the time the test runs.
    let (_, kr_id) = setup_key_result(
        &store,
        "weekly",
        date(2024, 1, 1),
        date(2024, 1, 1),
        0.0,
        100.0,
    )
    .await;

    let checkpoints = engine.generate_checkpoints(kr_id).await.unwrap();
    let id = checkpoints[0].id;

    let at_risk = engine
        .update_checkpoint(
            id,
            UpdateCheckpointRequest {
                actual_value: 90.0,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(at_risk.status, CheckpointStatus::AtRisk);

    let overdue = engine
        .update_checkpoint(
            id,
            UpdateCheckpointRequest {
                actual_value: 80.0,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(overdue.status, CheckpointStatus::Overdue);
    assert!(overdue.completed_at.is_none());
}

#[tokio::test]
async fn recreate_for_unknown_key_result_writes_nothing() {
    let store = Arc::new(MemoryStore::new());
    let engine = CheckpointEngine::new(store.clone());
    let missing = Uuid::new_v4();

    let err = engine.generate_checkpoints(missing).await.unwrap_err();
    assert!(matches!(err, OkrError::NotFound(_)));
    assert!(store.list_checkpoints(missing).await.unwrap().is_empty());
}

#[tokio::test]
async fn inverted_range_fails_without_side_effects() {
    let store = Arc::new(MemoryStore::new());
    let engine = CheckpointEngine::new(store.clone());
    let (_, kr_id) = setup_key_result(
        &store,
        "monthly",
        date(2024, 6, 1),
        date(2024, 1, 1),
        0.0,
        100.0,
    )
    .await;

    let err = engine.generate_checkpoints(kr_id).await.unwrap_err();
    assert!(matches!(err, OkrError::InvalidRange(_)));
    assert!(store.list_checkpoints(kr_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_frequency_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let engine = CheckpointEngine::new(store.clone());
    let (_, kr_id) = setup_key_result(
        &store,
        "daily",
        date(2024, 1, 1),
        date(2024, 3, 31),
        0.0,
        100.0,
    )
    .await;

    let err = engine.generate_checkpoints(kr_id).await.unwrap_err();
    assert!(matches!(err, OkrError::UnsupportedFrequency(_)));
    assert!(store.list_checkpoints(kr_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn objective_progress_is_the_mean_of_its_key_results() {
    let store = Arc::new(MemoryStore::new());
    let engine = CheckpointEngine::new(store.clone());

    let objective_id = Uuid::new_v4();
    store
        .insert_objective(objective_record(objective_id))
        .await
        .unwrap();

    let kr_a = Uuid::new_v4();
    let kr_b = Uuid::new_v4();
    for id in [kr_a, kr_b] {
        store
            .insert_key_result(key_result_record(
                id,
                objective_id,
                "monthly",
                date(2024, 1, 1),
                date(2024, 3, 31),
                0.0,
                100.0,
            ))
            .await
            .unwrap();
    }

    let checkpoints = engine.generate_checkpoints(kr_a).await.unwrap();
    engine
        .update_checkpoint(
            checkpoints.last().unwrap().id,
            UpdateCheckpointRequest {
                actual_value: 100.0,
                notes: None,
            },
        )
        .await
        .unwrap();

    // One key result at 100%, the other untouched at 0%.
    let objective = store.get_objective(objective_id).await.unwrap().unwrap();
    assert_eq!(objective.progress, 50.0);
}

#[tokio::test]
async fn dashboard_counts_cover_the_whole_store() {
    let store = Arc::new(MemoryStore::new());
    let engine = CheckpointEngine::new(store.clone());
    let (_, kr_id) = setup_key_result(
        &store,
        "monthly",
        date(2024, 1, 1),
        date(2024, 3, 31),
        0.0,
        300.0,
    )
    .await;
    engine.generate_checkpoints(kr_id).await.unwrap();

    let counts = store.dashboard_counts().await.unwrap();
    assert_eq!(counts.total_objectives, 1);
    assert_eq!(counts.completed_objectives, 0);
    assert_eq!(counts.total_key_results, 1);
    // Every 2024 checkpoint is past due and none is completed.
    assert_eq!(counts.overdue_checkpoints, 3);
    assert_eq!(counts.objective_progress_values, vec![0.0]);
}

#[tokio::test]
async fn key_result_starting_above_its_target_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let state = app_state(store.clone());
    let objective_id = Uuid::new_v4();
    store
        .insert_objective(objective_record(objective_id))
        .await
        .unwrap();

    // initial 80 towards target 20 would yield a decreasing schedule where
    // recording the starting value already completes a checkpoint.
    let req = CreateKeyResultRequest {
        title: "Reduce open tickets".to_string(),
        description: None,
        initial_value: Some(80.0),
        target_value: 20.0,
        unit: Some("tickets".to_string()),
        frequency: "monthly".to_string(),
        start_date: date(2024, 1, 1),
        end_date: date(2024, 3, 31),
    };
    let err = create_key_result(State(state), Path(objective_id), Json(req))
        .await
        .unwrap_err();

    assert!(matches!(err, OkrError::Validation(_)));
    assert!(store.list_key_results(objective_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn lowering_the_target_below_the_initial_value_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let state = app_state(store.clone());
    let (_, kr_id) = setup_key_result(
        &store,
        "monthly",
        date(2024, 1, 1),
        date(2024, 3, 31),
        50.0,
        100.0,
    )
    .await;

    let req = UpdateKeyResultRequest {
        title: None,
        description: None,
        target_value: Some(20.0),
        current_value: None,
        unit: None,
        status: None,
    };
    let err = update_key_result(State(state), Path(kr_id), Json(req))
        .await
        .unwrap_err();

    assert!(matches!(err, OkrError::Validation(_)));
    let kr = store.get_key_result(kr_id).await.unwrap().unwrap();
    assert_eq!(kr.target_value, 100.0);
}

#[tokio::test]
async fn rerecording_without_notes_clears_the_stored_notes() {
    let store = Arc::new(MemoryStore::new());
    let engine = CheckpointEngine::new(store.clone());
    let (_, kr_id) = setup_key_result(
        &store,
        "monthly",
        date(2024, 1, 1),
        date(2024, 3, 31),
        0.0,
        300.0,
    )
    .await;
    let checkpoints = engine.generate_checkpoints(kr_id).await.unwrap();
    let id = checkpoints[0].id;

    let with_notes = engine
        .update_checkpoint(
            id,
            UpdateCheckpointRequest {
                actual_value: 90.0,
                notes: Some("supply issues".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(with_notes.notes.as_deref(), Some("supply issues"));

    // Each update is a full recording; leaving notes out drops the old ones.
    let rerecorded = engine
        .update_checkpoint(
            id,
            UpdateCheckpointRequest {
                actual_value: 95.0,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert!(rerecorded.notes.is_none());
    assert_eq!(rerecorded.actual_value, Some(95.0));
}

/// Wraps the in-memory store; key-result updates can be switched to fail.
struct FlakyRollupStore {
    inner: MemoryStore,
    fail_key_result_updates: AtomicBool,
}

impl FlakyRollupStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_key_result_updates: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl OkrStore for FlakyRollupStore {
    async fn insert_objective(
        &self,
        record: ObjectiveRecord,
    ) -> Result<ObjectiveRecord, OkrError> {
        self.inner.insert_objective(record).await
    }

    async fn get_objective(&self, id: Uuid) -> Result<Option<ObjectiveRecord>, OkrError> {
        self.inner.get_objective(id).await
    }

    async fn list_objectives(
        &self,
        query: ListObjectivesQuery,
    ) -> Result<Vec<ObjectiveRecord>, OkrError> {
        self.inner.list_objectives(query).await
    }

    async fn update_objective(
        &self,
        record: ObjectiveRecord,
    ) -> Result<ObjectiveRecord, OkrError> {
        self.inner.update_objective(record).await
    }

    async fn delete_objective(&self, id: Uuid) -> Result<bool, OkrError> {
        self.inner.delete_objective(id).await
    }

    async fn insert_key_result(
        &self,
        record: KeyResultRecord,
    ) -> Result<KeyResultRecord, OkrError> {
        self.inner.insert_key_result(record).await
    }

    async fn get_key_result(&self, id: Uuid) -> Result<Option<KeyResultRecord>, OkrError> {
        self.inner.get_key_result(id).await
    }

    async fn list_key_results(
        &self,
        objective_id: Uuid,
    ) -> Result<Vec<KeyResultRecord>, OkrError> {
        self.inner.list_key_results(objective_id).await
    }

    async fn update_key_result(
        &self,
        record: KeyResultRecord,
    ) -> Result<KeyResultRecord, OkrError> {
        if self.fail_key_result_updates.load(Ordering::SeqCst) {
            return Err(OkrError::Database("connection reset".to_string()));
        }
        self.inner.update_key_result(record).await
    }

    async fn delete_key_result(&self, id: Uuid) -> Result<bool, OkrError> {
        self.inner.delete_key_result(id).await
    }

    async fn list_checkpoints(
        &self,
        key_result_id: Uuid,
    ) -> Result<Vec<CheckpointRecord>, OkrError> {
        self.inner.list_checkpoints(key_result_id).await
    }

    async fn get_checkpoint(&self, id: Uuid) -> Result<Option<CheckpointRecord>, OkrError> {
        self.inner.get_checkpoint(id).await
    }

    async fn replace_checkpoints(
        &self,
        key_result_id: Uuid,
        rows: Vec<CheckpointRecord>,
    ) -> Result<Vec<CheckpointRecord>, OkrError> {
        self.inner.replace_checkpoints(key_result_id, rows).await
    }

    async fn update_checkpoint(
        &self,
        record: CheckpointRecord,
    ) -> Result<CheckpointRecord, OkrError> {
        self.inner.update_checkpoint(record).await
    }

    async fn insert_action(&self, record: ActionRecord) -> Result<ActionRecord, OkrError> {
        self.inner.insert_action(record).await
    }

    async fn get_action(&self, id: Uuid) -> Result<Option<ActionRecord>, OkrError> {
        self.inner.get_action(id).await
    }

    async fn list_actions(&self, key_result_id: Uuid) -> Result<Vec<ActionRecord>, OkrError> {
        self.inner.list_actions(key_result_id).await
    }

    async fn update_action(&self, record: ActionRecord) -> Result<ActionRecord, OkrError> {
        self.inner.update_action(record).await
    }

    async fn delete_action(&self, id: Uuid) -> Result<bool, OkrError> {
        self.inner.delete_action(id).await
    }

    async fn dashboard_counts(&self) -> Result<DashboardCounts, OkrError> {
        self.inner.dashboard_counts().await
    }
}

#[tokio::test]
async fn checkpoint_update_survives_a_failed_roll_up() {
    let store = Arc::new(FlakyRollupStore::new());
    let engine = CheckpointEngine::new(store.clone());
    let (_, kr_id) = setup_key_result(
        &store,
        "monthly",
        date(2024, 1, 1),
        date(2024, 3, 31),
        0.0,
        300.0,
    )
    .await;
    let checkpoints = engine.generate_checkpoints(kr_id).await.unwrap();

    store.fail_key_result_updates.store(true, Ordering::SeqCst);

    let updated = engine
        .update_checkpoint(
            checkpoints[0].id,
            UpdateCheckpointRequest {
                actual_value: 120.0,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.actual_value, Some(120.0));

    // The row was stored even though the roll-up write failed.
    let stored = store
        .get_checkpoint(checkpoints[0].id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.actual_value, Some(120.0));
    // The key result kept its pre-update value.
    let kr = store.get_key_result(kr_id).await.unwrap().unwrap();
    assert_eq!(kr.current_value, 0.0);
}
