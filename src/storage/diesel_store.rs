//! Diesel-backed storage adapter.
//!
//! All blocking diesel work runs inside `spawn_blocking`; the pool hands out
//! `AnyConnection`s, so the same query code serves Postgres and SQLite.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::goals::types::ListObjectivesQuery;
use crate::shared::error::OkrError;
use crate::shared::models::schema::{actions, checkpoints, key_results, objectives};
use crate::shared::models::{ActionRecord, CheckpointRecord, KeyResultRecord, ObjectiveRecord};
use crate::shared::utils::DbPool;
use crate::storage::{DashboardCounts, OkrStore};

pub struct DieselStore {
    pool: DbPool,
}

impl DieselStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn run<T, F>(&self, f: F) -> Result<T, OkrError>
    where
        T: Send + 'static,
        F: FnOnce(&mut crate::shared::utils::AnyConnection) -> Result<T, OkrError>
            + Send
            + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| OkrError::Database(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| OkrError::Database(e.to_string()))?
    }
}

fn db_err(e: diesel::result::Error) -> OkrError {
    OkrError::Database(e.to_string())
}

#[async_trait]
impl OkrStore for DieselStore {
    async fn insert_objective(
        &self,
        record: ObjectiveRecord,
    ) -> Result<ObjectiveRecord, OkrError> {
        self.run(move |conn| {
            diesel::insert_into(objectives::table)
                .values(&record)
                .execute(conn)
                .map_err(db_err)?;
            Ok(record)
        })
        .await
    }

    async fn get_objective(&self, id: Uuid) -> Result<Option<ObjectiveRecord>, OkrError> {
        self.run(move |conn| {
            objectives::table
                .find(id.to_string())
                .first::<ObjectiveRecord>(conn)
                .optional()
                .map_err(db_err)
        })
        .await
    }

    async fn list_objectives(
        &self,
        query: ListObjectivesQuery,
    ) -> Result<Vec<ObjectiveRecord>, OkrError> {
        self.run(move |conn| {
            let mut records = objectives::table
                .order(objectives::created_at.desc())
                .load::<ObjectiveRecord>(conn)
                .map_err(db_err)?;

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
        })
        .await
    }

    async fn update_objective(
        &self,
        record: ObjectiveRecord,
    ) -> Result<ObjectiveRecord, OkrError> {
        self.run(move |conn| {
            let updated = diesel::update(objectives::table.find(record.id.clone()))
                .set(&record)
                .execute(conn)
                .map_err(db_err)?;
            if updated == 0 {
                return Err(OkrError::NotFound(format!(
                    "Objective {} not found",
                    record.id
                )));
            }
            Ok(record)
        })
        .await
    }

    async fn delete_objective(&self, id: Uuid) -> Result<bool, OkrError> {
        self.run(move |conn| {
            let id = id.to_string();
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                let kr_ids: Vec<String> = key_results::table
                    .filter(key_results::objective_id.eq(&id))
                    .select(key_results::id)
                    .load(conn)?;

                diesel::delete(
                    checkpoints::table.filter(checkpoints::key_result_id.eq_any(&kr_ids)),
                )
                .execute(conn)?;
                diesel::delete(actions::table.filter(actions::key_result_id.eq_any(&kr_ids)))
                    .execute(conn)?;
                diesel::delete(key_results::table.filter(key_results::objective_id.eq(&id)))
                    .execute(conn)?;
                let deleted =
                    diesel::delete(objectives::table.find(&id)).execute(conn)?;
                Ok(deleted > 0)
            })
            .map_err(db_err)
        })
        .await
    }

    async fn insert_key_result(
        &self,
        record: KeyResultRecord,
    ) -> Result<KeyResultRecord, OkrError> {
        self.run(move |conn| {
            diesel::insert_into(key_results::table)
                .values(&record)
                .execute(conn)
                .map_err(db_err)?;
            Ok(record)
        })
        .await
    }

    async fn get_key_result(&self, id: Uuid) -> Result<Option<KeyResultRecord>, OkrError> {
        self.run(move |conn| {
            key_results::table
                .find(id.to_string())
                .first::<KeyResultRecord>(conn)
                .optional()
                .map_err(db_err)
        })
        .await
    }

    async fn list_key_results(
        &self,
        objective_id: Uuid,
    ) -> Result<Vec<KeyResultRecord>, OkrError> {
        self.run(move |conn| {
            key_results::table
                .filter(key_results::objective_id.eq(objective_id.to_string()))
                .order(key_results::created_at.asc())
                .load::<KeyResultRecord>(conn)
                .map_err(db_err)
        })
        .await
    }

    async fn update_key_result(
        &self,
        record: KeyResultRecord,
    ) -> Result<KeyResultRecord, OkrError> {
        self.run(move |conn| {
            let updated = diesel::update(key_results::table.find(record.id.clone()))
                .set(&record)
                .execute(conn)
                .map_err(db_err)?;
            if updated == 0 {
                return Err(OkrError::NotFound(format!(
                    "Key result {} not found",
                    record.id
                )));
            }
            Ok(record)
        })
        .await
    }

    async fn delete_key_result(&self, id: Uuid) -> Result<bool, OkrError> {
        self.run(move |conn| {
            let id = id.to_string();
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                diesel::delete(
                    checkpoints::table.filter(checkpoints::key_result_id.eq(&id)),
                )
                .execute(conn)?;
                diesel::delete(actions::table.filter(actions::key_result_id.eq(&id)))
                    .execute(conn)?;
                let deleted = diesel::delete(key_results::table.find(&id)).execute(conn)?;
                Ok(deleted > 0)
            })
            .map_err(db_err)
        })
        .await
    }

    async fn list_checkpoints(
        &self,
        key_result_id: Uuid,
    ) -> Result<Vec<CheckpointRecord>, OkrError> {
        self.run(move |conn| {
            checkpoints::table
                .filter(checkpoints::key_result_id.eq(key_result_id.to_string()))
                .order(checkpoints::due_date.asc())
                .load::<CheckpointRecord>(conn)
                .map_err(db_err)
        })
        .await
    }

    async fn get_checkpoint(&self, id: Uuid) -> Result<Option<CheckpointRecord>, OkrError> {
        self.run(move |conn| {
            checkpoints::table
                .find(id.to_string())
                .first::<CheckpointRecord>(conn)
                .optional()
                .map_err(db_err)
        })
        .await
    }

    async fn replace_checkpoints(
        &self,
        key_result_id: Uuid,
        rows: Vec<CheckpointRecord>,
    ) -> Result<Vec<CheckpointRecord>, OkrError> {
        self.run(move |conn| {
            let key = key_result_id.to_string();
            conn.transaction::<_, diesel::result::Error, _>(|conn| {
                diesel::delete(
                    checkpoints::table.filter(checkpoints::key_result_id.eq(&key)),
                )
                .execute(conn)?;
                for row in &rows {
                    diesel::insert_into(checkpoints::table)
                        .values(row)
                        .execute(conn)?;
                }
                Ok(())
            })
            .map_err(db_err)?;
            Ok(rows)
        })
        .await
    }

    async fn update_checkpoint(
        &self,
        record: CheckpointRecord,
    ) -> Result<CheckpointRecord, OkrError> {
        self.run(move |conn| {
            let updated = diesel::update(checkpoints::table.find(record.id.clone()))
                .set(&record)
                .execute(conn)
                .map_err(db_err)?;
            if updated == 0 {
                return Err(OkrError::NotFound(format!(
                    "Checkpoint {} not found",
                    record.id
                )));
            }
            Ok(record)
        })
        .await
    }

    async fn insert_action(&self, record: ActionRecord) -> Result<ActionRecord, OkrError> {
        self.run(move |conn| {
            diesel::insert_into(actions::table)
                .values(&record)
                .execute(conn)
                .map_err(db_err)?;
            Ok(record)
        })
        .await
    }

    async fn get_action(&self, id: Uuid) -> Result<Option<ActionRecord>, OkrError> {
        self.run(move |conn| {
            actions::table
                .find(id.to_string())
                .first::<ActionRecord>(conn)
                .optional()
                .map_err(db_err)
        })
        .await
    }

    async fn list_actions(&self, key_result_id: Uuid) -> Result<Vec<ActionRecord>, OkrError> {
        self.run(move |conn| {
            actions::table
                .filter(actions::key_result_id.eq(key_result_id.to_string()))
                .order(actions::created_at.asc())
                .load::<ActionRecord>(conn)
                .map_err(db_err)
        })
        .await
    }

    async fn update_action(&self, record: ActionRecord) -> Result<ActionRecord, OkrError> {
        self.run(move |conn| {
            let updated = diesel::update(actions::table.find(record.id.clone()))
                .set(&record)
                .execute(conn)
                .map_err(db_err)?;
            if updated == 0 {
                return Err(OkrError::NotFound(format!(
                    "Action {} not found",
                    record.id
                )));
            }
            Ok(record)
        })
        .await
    }

    async fn delete_action(&self, id: Uuid) -> Result<bool, OkrError> {
        self.run(move |conn| {
            let deleted = diesel::delete(actions::table.find(id.to_string()))
                .execute(conn)
                .map_err(db_err)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn dashboard_counts(&self) -> Result<DashboardCounts, OkrError> {
        self.run(move |conn| {
            let today = Utc::now().date_naive();

            let total_objectives: i64 = objectives::table
                .count()
                .get_result(conn)
                .map_err(db_err)?;
            let completed_objectives: i64 = objectives::table
                .filter(objectives::status.eq("completed"))
                .count()
                .get_result(conn)
                .map_err(db_err)?;
            let total_key_results: i64 = key_results::table
                .count()
                .get_result(conn)
                .map_err(db_err)?;
            let completed_key_results: i64 = key_results::table
                .filter(key_results::status.eq("completed"))
                .count()
                .get_result(conn)
                .map_err(db_err)?;
            let total_actions: i64 =
                actions::table.count().get_result(conn).map_err(db_err)?;
            let completed_actions: i64 = actions::table
                .filter(actions::status.eq("completed"))
                .count()
                .get_result(conn)
                .map_err(db_err)?;
            let overdue_checkpoints: i64 = checkpoints::table
                .filter(checkpoints::due_date.lt(today))
                .filter(checkpoints::status.ne("completed"))
                .count()
                .get_result(conn)
                .map_err(db_err)?;
            let objective_progress_values: Vec<f64> = objectives::table
                .select(objectives::progress)
                .load(conn)
                .map_err(db_err)?;

            Ok(DashboardCounts {
                total_objectives,
                completed_objectives,
                total_key_results,
                completed_key_results,
                total_actions,
                completed_actions,
                overdue_checkpoints,
                objective_progress_values,
            })
        })
        .await
    }
}
