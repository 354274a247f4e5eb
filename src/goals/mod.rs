//! OKR module: objectives, key results, checkpoints and the dashboard.

pub mod actions;
pub mod checkpoints;
pub mod periods;
pub mod progress;
pub mod types;

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use log::info;
use std::sync::Arc;
use uuid::Uuid;

use crate::goals::checkpoints::refresh_record_status;
use crate::goals::periods::generate_periods;
use crate::goals::types::{
    record_to_checkpoint, record_to_key_result, record_to_objective, Checkpoint,
    CreateKeyResultRequest, CreateObjectiveRequest, Frequency, KRStatus, KeyResult,
    ListObjectivesQuery, Objective, ObjectiveStatus, OkrDashboard, UpdateCheckpointRequest,
    UpdateKeyResultRequest, UpdateObjectiveRequest,
};
use crate::shared::error::OkrError;
use crate::shared::models::{KeyResultRecord, ObjectiveRecord};
use crate::shared::state::AppState;

pub async fn list_objectives(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListObjectivesQuery>,
) -> Result<Json<Vec<Objective>>, OkrError> {
    let records = state.store.list_objectives(query).await?;
    Ok(Json(records.into_iter().map(record_to_objective).collect()))
}

pub async fn create_objective(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateObjectiveRequest>,
) -> Result<Json<Objective>, OkrError> {
    if req.end_date < req.start_date {
        return Err(OkrError::Validation(format!(
            "end date {} precedes start date {}",
            req.end_date, req.start_date
        )));
    }
    let now = Utc::now().naive_utc();
    let record = ObjectiveRecord {
        id: Uuid::new_v4().to_string(),
        owner_id: req.owner_id.unwrap_or_else(Uuid::nil).to_string(),
        title: req.title,
        description: req.description,
        start_date: req.start_date,
        end_date: req.end_date,
        status: ObjectiveStatus::Draft.to_str().to_string(),
        progress: 0.0,
        created_at: now,
        updated_at: now,
    };
    let inserted = state.store.insert_objective(record).await?;
    info!("Created objective: {} ({})", inserted.title, inserted.id);
    Ok(Json(record_to_objective(inserted)))
}

pub async fn get_objective(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Objective>, OkrError> {
    let record = state
        .store
        .get_objective(id)
        .await?
        .ok_or_else(|| OkrError::NotFound(format!("Objective {id} not found")))?;
    Ok(Json(record_to_objective(record)))
}

pub async fn update_objective(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateObjectiveRequest>,
) -> Result<Json<Objective>, OkrError> {
    let mut record = state
        .store
        .get_objective(id)
        .await?
        .ok_or_else(|| OkrError::NotFound(format!("Objective {id} not found")))?;

    if let Some(title) = req.title {
        record.title = title;
    }
    if let Some(description) = req.description {
        record.description = Some(description);
    }
    if let Some(status) = req.status {
        record.status = status.to_str().to_string();
    }
    if let Some(start_date) = req.start_date {
        record.start_date = start_date;
    }
    if let Some(end_date) = req.end_date {
        record.end_date = end_date;
    }
    if record.end_date < record.start_date {
        return Err(OkrError::Validation(format!(
            "end date {} precedes start date {}",
            record.end_date, record.start_date
        )));
    }
    record.updated_at = Utc::now().naive_utc();

    let updated = state.store.update_objective(record).await?;
    info!("Updated objective: {} ({})", updated.title, updated.id);
    Ok(Json(record_to_objective(updated)))
}

pub async fn delete_objective(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, OkrError> {
    let deleted = state.store.delete_objective(id).await?;
    if !deleted {
        return Err(OkrError::NotFound(format!("Objective {id} not found")));
    }
    info!("Deleted objective: {id}");
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn list_key_results(
    State(state): State<Arc<AppState>>,
    Path(objective_id): Path<Uuid>,
) -> Result<Json<Vec<KeyResult>>, OkrError> {
    let records = state.store.list_key_results(objective_id).await?;
    Ok(Json(records.into_iter().map(record_to_key_result).collect()))
}

pub async fn create_key_result(
    State(state): State<Arc<AppState>>,
    Path(objective_id): Path<Uuid>,
    Json(req): Json<CreateKeyResultRequest>,
) -> Result<Json<KeyResult>, OkrError> {
    state
        .store
        .get_objective(objective_id)
        .await?
        .ok_or_else(|| OkrError::NotFound(format!("Objective {objective_id} not found")))?;

    if req.target_value < 0.0 {
        return Err(OkrError::Validation(
            "target_value must be non-negative".to_string(),
        ));
    }
    let frequency = Frequency::parse(&req.frequency)?;
    let initial_value = req.initial_value.unwrap_or(0.0);
    // Checkpoint targets interpolate from initial to target, so an initial
    // value above the target would produce a decreasing schedule.
    if initial_value > req.target_value {
        return Err(OkrError::Validation(format!(
            "initial_value {} exceeds target_value {}",
            initial_value, req.target_value
        )));
    }
    // Validates the date range before anything is written.
    generate_periods(
        req.start_date,
        req.end_date,
        frequency,
        initial_value,
        req.target_value,
    )?;

    let now = Utc::now().naive_utc();
    let record = KeyResultRecord {
        id: Uuid::new_v4().to_string(),
        objective_id: objective_id.to_string(),
        title: req.title,
        description: req.description,
        initial_value,
        target_value: req.target_value,
        current_value: initial_value,
        unit: req.unit,
        frequency: frequency.to_str().to_string(),
        start_date: req.start_date,
        end_date: req.end_date,
        status: KRStatus::Active.to_str().to_string(),
        progress: 0.0,
        created_at: now,
        updated_at: now,
    };
    let inserted = state.store.insert_key_result(record).await?;
    let id = Uuid::parse_str(&inserted.id).unwrap_or_else(|_| Uuid::nil());

    // Seed the initial checkpoint schedule and fold the new key result into
    // the objective's progress.
    state.engine.generate_checkpoints(id).await?;
    state.engine.roll_up_objective(objective_id).await?;

    info!("Created key result: {} ({})", inserted.title, inserted.id);
    Ok(Json(record_to_key_result(inserted)))
}

pub async fn get_key_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<KeyResult>, OkrError> {
    let record = state
        .store
        .get_key_result(id)
        .await?
        .ok_or_else(|| OkrError::NotFound(format!("Key result {id} not found")))?;
    Ok(Json(record_to_key_result(record)))
}

pub async fn update_key_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateKeyResultRequest>,
) -> Result<Json<KeyResult>, OkrError> {
    let mut record = state
        .store
        .get_key_result(id)
        .await?
        .ok_or_else(|| OkrError::NotFound(format!("Key result {id} not found")))?;

    if let Some(title) = req.title {
        record.title = title;
    }
    if let Some(description) = req.description {
        record.description = Some(description);
    }
    if let Some(target_value) = req.target_value {
        if target_value < 0.0 {
            return Err(OkrError::Validation(
                "target_value must be non-negative".to_string(),
            ));
        }
        if target_value < record.initial_value {
            return Err(OkrError::Validation(format!(
                "target_value {} falls below initial_value {}",
                target_value, record.initial_value
            )));
        }
        record.target_value = target_value;
    }
    if let Some(current_value) = req.current_value {
        record.current_value = current_value;
    }
    if let Some(unit) = req.unit {
        record.unit = Some(unit);
    }
    if let Some(status) = req.status {
        record.status = status.to_str().to_string();
    }
    record.progress = progress::key_result_progress(
        record.initial_value,
        record.target_value,
        record.current_value,
    );
    record.updated_at = Utc::now().naive_utc();

    let updated = state.store.update_key_result(record).await?;
    let objective_id = Uuid::parse_str(&updated.objective_id).unwrap_or_else(|_| Uuid::nil());
    state.engine.roll_up_objective(objective_id).await?;

    info!("Updated key result: {} ({})", updated.title, updated.id);
    Ok(Json(record_to_key_result(updated)))
}

pub async fn delete_key_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, OkrError> {
    let record = state
        .store
        .get_key_result(id)
        .await?
        .ok_or_else(|| OkrError::NotFound(format!("Key result {id} not found")))?;
    let objective_id = Uuid::parse_str(&record.objective_id).unwrap_or_else(|_| Uuid::nil());

    state.store.delete_key_result(id).await?;
    state.engine.roll_up_objective(objective_id).await?;

    info!("Deleted key result: {id}");
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Destructive: replaces the checkpoint schedule and discards any recorded
/// actual values. Clients put a confirmation dialog in front of this call.
pub async fn recreate_checkpoints(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Checkpoint>>, OkrError> {
    let checkpoints = state.engine.generate_checkpoints(id).await?;
    Ok(Json(checkpoints))
}

pub async fn list_checkpoints(
    State(state): State<Arc<AppState>>,
    Path(key_result_id): Path<Uuid>,
) -> Result<Json<Vec<Checkpoint>>, OkrError> {
    let mut records = state.store.list_checkpoints(key_result_id).await?;
    let today = Utc::now().date_naive();
    for record in &mut records {
        refresh_record_status(record, today);
    }
    Ok(Json(records.into_iter().map(record_to_checkpoint).collect()))
}

pub async fn update_checkpoint(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCheckpointRequest>,
) -> Result<Json<Checkpoint>, OkrError> {
    let checkpoint = state.engine.update_checkpoint(id, req).await?;
    Ok(Json(checkpoint))
}

pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<OkrDashboard>, OkrError> {
    let counts = state.store.dashboard_counts().await?;
    let average_progress = progress::objective_progress(&counts.objective_progress_values);
    Ok(Json(OkrDashboard {
        total_objectives: counts.total_objectives,
        completed_objectives: counts.completed_objectives,
        total_key_results: counts.total_key_results,
        completed_key_results: counts.completed_key_results,
        total_actions: counts.total_actions,
        completed_actions: counts.completed_actions,
        average_progress,
        overdue_checkpoints: counts.overdue_checkpoints,
    }))
}

pub fn configure_okr_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/okr/objectives",
            get(list_objectives).post(create_objective),
        )
        .route(
            "/api/okr/objectives/:id",
            get(get_objective)
                .put(update_objective)
                .delete(delete_objective),
        )
        .route(
            "/api/okr/objectives/:id/key-results",
            get(list_key_results).post(create_key_result),
        )
        .route(
            "/api/okr/key-results/:id",
            get(get_key_result)
                .put(update_key_result)
                .delete(delete_key_result),
        )
        .route(
            "/api/okr/key-results/:id/recreate-checkpoints",
            post(recreate_checkpoints),
        )
        .route("/api/okr/key-results/:id/checkpoints", get(list_checkpoints))
        .route("/api/okr/checkpoints/:id", put(update_checkpoint))
        .route("/api/okr/dashboard", get(get_dashboard))
}
