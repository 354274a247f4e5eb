//! Action CRUD: tasks hanging off a key result.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use log::info;
use std::sync::Arc;
use uuid::Uuid;

use crate::goals::types::{
    record_to_action, Action, ActionPriority, ActionStatus, CreateActionRequest,
    UpdateActionRequest,
};
use crate::shared::error::OkrError;
use crate::shared::models::ActionRecord;
use crate::shared::state::AppState;

pub async fn list_actions(
    State(state): State<Arc<AppState>>,
    Path(key_result_id): Path<Uuid>,
) -> Result<Json<Vec<Action>>, OkrError> {
    let records = state.store.list_actions(key_result_id).await?;
    Ok(Json(records.into_iter().map(record_to_action).collect()))
}

pub async fn create_action(
    State(state): State<Arc<AppState>>,
    Path(key_result_id): Path<Uuid>,
    Json(req): Json<CreateActionRequest>,
) -> Result<Json<Action>, OkrError> {
    state
        .store
        .get_key_result(key_result_id)
        .await?
        .ok_or_else(|| OkrError::NotFound(format!("Key result {key_result_id} not found")))?;

    let now = Utc::now().naive_utc();
    let record = ActionRecord {
        id: Uuid::new_v4().to_string(),
        key_result_id: key_result_id.to_string(),
        title: req.title,
        description: req.description,
        due_date: req.due_date,
        priority: req
            .priority
            .unwrap_or(ActionPriority::Medium)
            .to_str()
            .to_string(),
        status: ActionStatus::Todo.to_str().to_string(),
        completed_at: None,
        created_at: now,
        updated_at: now,
    };
    let inserted = state.store.insert_action(record).await?;
    info!("Created action: {} ({})", inserted.title, inserted.id);
    Ok(Json(record_to_action(inserted)))
}

pub async fn get_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Action>, OkrError> {
    let record = state
        .store
        .get_action(id)
        .await?
        .ok_or_else(|| OkrError::NotFound(format!("Action {id} not found")))?;
    Ok(Json(record_to_action(record)))
}

pub async fn update_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateActionRequest>,
) -> Result<Json<Action>, OkrError> {
    let mut record = state
        .store
        .get_action(id)
        .await?
        .ok_or_else(|| OkrError::NotFound(format!("Action {id} not found")))?;

    if let Some(title) = req.title {
        record.title = title;
    }
    if let Some(description) = req.description {
        record.description = Some(description);
    }
    if let Some(due_date) = req.due_date {
        record.due_date = Some(due_date);
    }
    if let Some(priority) = req.priority {
        record.priority = priority.to_str().to_string();
    }
    if let Some(status) = req.status {
        record.completed_at = if status == ActionStatus::Completed {
            record.completed_at.or(Some(Utc::now().naive_utc()))
        } else {
            None
        };
        record.status = status.to_str().to_string();
    }
    record.updated_at = Utc::now().naive_utc();

    let updated = state.store.update_action(record).await?;
    info!("Updated action: {} ({})", updated.title, updated.id);
    Ok(Json(record_to_action(updated)))
}

pub async fn delete_action(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, OkrError> {
    let deleted = state.store.delete_action(id).await?;
    if !deleted {
        return Err(OkrError::NotFound(format!("Action {id} not found")));
    }
    info!("Deleted action: {id}");
    Ok(Json(serde_json::json!({ "success": true })))
}

pub fn configure_action_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/okr/key-results/:id/actions",
            get(list_actions).post(create_action),
        )
        .route(
            "/api/okr/actions/:id",
            get(get_action).put(update_action).delete(delete_action),
        )
}
