//! Storage seam for the OKR entities.
//!
//! One trait, one concrete adapter per backend, chosen at process start.
//! Handlers and the checkpoint engine only ever see `Arc<dyn OkrStore>`.

pub mod diesel_store;
pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::goals::types::ListObjectivesQuery;
use crate::shared::error::OkrError;
use crate::shared::models::{ActionRecord, CheckpointRecord, KeyResultRecord, ObjectiveRecord};

pub use diesel_store::DieselStore;
pub use memory::MemoryStore;

/// Raw counts backing the dashboard; averaging happens in the aggregator.
#[derive(Debug, Clone, Default)]
pub struct DashboardCounts {
    pub total_objectives: i64,
    pub completed_objectives: i64,
    pub total_key_results: i64,
    pub completed_key_results: i64,
    pub total_actions: i64,
    pub completed_actions: i64,
    pub overdue_checkpoints: i64,
    pub objective_progress_values: Vec<f64>,
}

#[async_trait]
pub trait OkrStore: Send + Sync {
    async fn insert_objective(&self, record: ObjectiveRecord)
        -> Result<ObjectiveRecord, OkrError>;
    async fn get_objective(&self, id: Uuid) -> Result<Option<ObjectiveRecord>, OkrError>;
    async fn list_objectives(
        &self,
        query: ListObjectivesQuery,
    ) -> Result<Vec<ObjectiveRecord>, OkrError>;
    async fn update_objective(&self, record: ObjectiveRecord)
        -> Result<ObjectiveRecord, OkrError>;
    /// Deletes the objective and everything under it: key results,
    /// checkpoints and actions.
    async fn delete_objective(&self, id: Uuid) -> Result<bool, OkrError>;

    async fn insert_key_result(
        &self,
        record: KeyResultRecord,
    ) -> Result<KeyResultRecord, OkrError>;
    async fn get_key_result(&self, id: Uuid) -> Result<Option<KeyResultRecord>, OkrError>;
    async fn list_key_results(
        &self,
        objective_id: Uuid,
    ) -> Result<Vec<KeyResultRecord>, OkrError>;
    async fn update_key_result(
        &self,
        record: KeyResultRecord,
    ) -> Result<KeyResultRecord, OkrError>;
    /// Deletes the key result and its checkpoints and actions.
    async fn delete_key_result(&self, id: Uuid) -> Result<bool, OkrError>;

    async fn list_checkpoints(
        &self,
        key_result_id: Uuid,
    ) -> Result<Vec<CheckpointRecord>, OkrError>;
    async fn get_checkpoint(&self, id: Uuid) -> Result<Option<CheckpointRecord>, OkrError>;
    /// Delete-then-insert of a key result's checkpoint set, atomic with
    /// respect to concurrent readers: nobody observes a half-regenerated
    /// schedule.
    async fn replace_checkpoints(
        &self,
        key_result_id: Uuid,
        rows: Vec<CheckpointRecord>,
    ) -> Result<Vec<CheckpointRecord>, OkrError>;
    async fn update_checkpoint(
        &self,
        record: CheckpointRecord,
    ) -> Result<CheckpointRecord, OkrError>;

    async fn insert_action(&self, record: ActionRecord) -> Result<ActionRecord, OkrError>;
    async fn get_action(&self, id: Uuid) -> Result<Option<ActionRecord>, OkrError>;
    async fn list_actions(&self, key_result_id: Uuid) -> Result<Vec<ActionRecord>, OkrError>;
    async fn update_action(&self, record: ActionRecord) -> Result<ActionRecord, OkrError>;
    async fn delete_action(&self, id: Uuid) -> Result<bool, OkrError>;

    async fn dashboard_counts(&self) -> Result<DashboardCounts, OkrError>;
}
