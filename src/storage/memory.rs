//! In-memory storage adapter. Backs the test suite and small demo runs;
//! replacement of a checkpoint set happens under one write lock, so readers
//! see either the old schedule or the new one, never a mix.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::goals::types::ListObjectivesQuery;
use crate::shared::error::OkrError;
use crate::shared::models::{ActionRecord, CheckpointRecord, KeyResultRecord, ObjectiveRecord};
use crate::storage::{DashboardCounts, OkrStore};

#[derive(Default)]
struct Inner {
    objectives: Vec<ObjectiveRecord>,
    key_results: Vec<KeyResultRecord>,
    checkpoints: Vec<CheckpointRecord>,
    actions: Vec<ActionRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OkrStore for MemoryStore {
    async fn insert_objective(
        &self,
        record: ObjectiveRecord,
    ) -> Result<ObjectiveRecord, OkrError> {
        let mut inner = self.inner.write().await;
        inner.objectives.push(record.clone());
        Ok(record)
    }

    async fn get_objective(&self, id: Uuid) -> Result<Option<ObjectiveRecord>, OkrError> {
        let inner = self.inner.read().await;
        let id = id.to_string();
        Ok(inner.objectives.iter().find(|r| r.id == id).cloned())
    }

    async fn list_objectives(
        &self,
        query: ListObjectivesQuery,
    ) -> Result<Vec<ObjectiveRecord>, OkrError> {
        let inner = self.inner.read().await;
        let mut records = inner.objectives.clone();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(owner_id) = query.owner_id {
            let owner_id = owner_id.to_string();
            records.retain(|r| r.owner_id == owner_id);
        }
        if let Some(status) = query.status {
            records.retain(|r| r.status == status);
        }
        if let Some(offset) = query.offset {
            records = records.into_iter().skip(offset.max(0) as usize).collect();
        }
        if let Some(limit) = query.limit {
            records.truncate(limit.max(0) as usize);
        }
        Ok(records)
    }

    async fn update_objective(
        &self,
        record: ObjectiveRecord,
    ) -> Result<ObjectiveRecord, OkrError> {
        let mut inner = self.inner.write().await;
        match inner.objectives.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(record)
            }
            None => Err(OkrError::NotFound(format!(
                "Objective {} not found",
                record.id
            ))),
        }
    }

    async fn delete_objective(&self, id: Uuid) -> Result<bool, OkrError> {
        let mut inner = self.inner.write().await;
        let id = id.to_string();
        let kr_ids: Vec<String> = inner
            .key_results
            .iter()
            .filter(|kr| kr.objective_id == id)
            .map(|kr| kr.id.clone())
            .collect();
        inner
            .checkpoints
            .retain(|c| !kr_ids.contains(&c.key_result_id));
        inner.actions.retain(|a| !kr_ids.contains(&a.key_result_id));
        inner.key_results.retain(|kr| kr.objective_id != id);
        let before = inner.objectives.len();
        inner.objectives.retain(|r| r.id != id);
        Ok(inner.objectives.len() < before)
    }

    async fn insert_key_result(
        &self,
        record: KeyResultRecord,
    ) -> Result<KeyResultRecord, OkrError> {
        let mut inner = self.inner.write().await;
        inner.key_results.push(record.clone());
        Ok(record)
    }

    async fn get_key_result(&self, id: Uuid) -> Result<Option<KeyResultRecord>, OkrError> {
        let inner = self.inner.read().await;
        let id = id.to_string();
        Ok(inner.key_results.iter().find(|r| r.id == id).cloned())
    }

    async fn list_key_results(
        &self,
        objective_id: Uuid,
    ) -> Result<Vec<KeyResultRecord>, OkrError> {
        let inner = self.inner.read().await;
        let objective_id = objective_id.to_string();
        let mut records: Vec<KeyResultRecord> = inner
            .key_results
            .iter()
            .filter(|r| r.objective_id == objective_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    async fn update_key_result(
        &self,
        record: KeyResultRecord,
    ) -> Result<KeyResultRecord, OkrError> {
        let mut inner = self.inner.write().await;
        match inner.key_results.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(record)
            }
            None => Err(OkrError::NotFound(format!(
                "Key result {} not found",
                record.id
            ))),
        }
    }

    async fn delete_key_result(&self, id: Uuid) -> Result<bool, OkrError> {
        let mut inner = self.inner.write().await;
        let id = id.to_string();
        inner.checkpoints.retain(|c| c.key_result_id != id);
        inner.actions.retain(|a| a.key_result_id != id);
        let before = inner.key_results.len();
        inner.key_results.retain(|r| r.id != id);
        Ok(inner.key_results.len() < before)
    }

    async fn list_checkpoints(
        &self,
        key_result_id: Uuid,
    ) -> Result<Vec<CheckpointRecord>, OkrError> {
        let inner = self.inner.read().await;
        let key_result_id = key_result_id.to_string();
        let mut records: Vec<CheckpointRecord> = inner
            .checkpoints
            .iter()
            .filter(|r| r.key_result_id == key_result_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.due_date.cmp(&b.due_date));
        Ok(records)
    }

    async fn get_checkpoint(&self, id: Uuid) -> Result<Option<CheckpointRecord>, OkrError> {
        let inner = self.inner.read().await;
        let id = id.to_string();
        Ok(inner.checkpoints.iter().find(|r| r.id == id).cloned())
    }

    async fn replace_checkpoints(
        &self,
        key_result_id: Uuid,
        rows: Vec<CheckpointRecord>,
    ) -> Result<Vec<CheckpointRecord>, OkrError> {
        let mut inner = self.inner.write().await;
        let key_result_id = key_result_id.to_string();
        inner.checkpoints.retain(|c| c.key_result_id != key_result_id);
        inner.checkpoints.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn update_checkpoint(
        &self,
        record: CheckpointRecord,
    ) -> Result<CheckpointRecord, OkrError> {
        let mut inner = self.inner.write().await;
        match inner.checkpoints.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(record)
            }
            None => Err(OkrError::NotFound(format!(
                "Checkpoint {} not found",
                record.id
            ))),
        }
    }

    async fn insert_action(&self, record: ActionRecord) -> Result<ActionRecord, OkrError> {
        let mut inner = self.inner.write().await;
        inner.actions.push(record.clone());
        Ok(record)
    }

    async fn get_action(&self, id: Uuid) -> Result<Option<ActionRecord>, OkrError> {
        let inner = self.inner.read().await;
        let id = id.to_string();
        Ok(inner.actions.iter().find(|r| r.id == id).cloned())
    }

    async fn list_actions(&self, key_result_id: Uuid) -> Result<Vec<ActionRecord>, OkrError> {
        let inner = self.inner.read().await;
        let key_result_id = key_result_id.to_string();
        let mut records: Vec<ActionRecord> = inner
            .actions
            .iter()
            .filter(|r| r.key_result_id == key_result_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    async fn update_action(&self, record: ActionRecord) -> Result<ActionRecord, OkrError> {
        let mut inner = self.inner.write().await;
        match inner.actions.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(record)
            }
            None => Err(OkrError::NotFound(format!(
                "Action {} not found",
                record.id
            ))),
        }
    }

    async fn delete_action(&self, id: Uuid) -> Result<bool, OkrError> {
        let mut inner = self.inner.write().await;
        let id = id.to_string();
        let before = inner.actions.len();
        inner.actions.retain(|r| r.id != id);
        Ok(inner.actions.len() < before)
    }

    async fn dashboard_counts(&self) -> Result<DashboardCounts, OkrError> {
        let inner = self.inner.read().await;
        let today = Utc::now().date_naive();
        Ok(DashboardCounts {
            total_objectives: inner.objectives.len() as i64,
            completed_objectives: inner
                .objectives
                .iter()
                .filter(|o| o.status == "completed")
                .count() as i64,
            total_key_results: inner.key_results.len() as i64,
            completed_key_results: inner
                .key_results
                .iter()
                .filter(|kr| kr.status == "completed")
                .count() as i64,
            total_actions: inner.actions.len() as i64,
            completed_actions: inner
                .actions
                .iter()
                .filter(|a| a.status == "completed")
                .count() as i64,
            overdue_checkpoints: inner
                .checkpoints
                .iter()
                .filter(|c| c.due_date < today && c.status != "completed")
                .count() as i64,
            objective_progress_values: inner.objectives.iter().map(|o| o.progress).collect(),
        })
    }
}
