//! Domain types for the OKR module.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::goals::progress;
use crate::shared::error::OkrError;
use crate::shared::models::{ActionRecord, CheckpointRecord, KeyResultRecord, ObjectiveRecord};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ObjectiveStatus,
    pub progress: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStatus {
    Draft,
    Active,
    Completed,
    Cancelled,
}

impl ObjectiveStatus {
    pub fn from_str(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => Self::Draft,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyResult {
    pub id: Uuid,
    pub objective_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub initial_value: f64,
    pub target_value: f64,
    pub current_value: f64,
    pub unit: Option<String>,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: KRStatus,
    pub progress: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
}

impl Frequency {
    /// Unlike the status enums this never falls back to a default: an
    /// unknown frequency must surface as an error, not a silent weekly.
    pub fn parse(s: &str) -> Result<Self, OkrError> {
        match s {
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            other => Err(OkrError::UnsupportedFrequency(format!(
                "unknown frequency '{other}'"
            ))),
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KRStatus {
    Active,
    Completed,
    Delayed,
    Cancelled,
}

impl KRStatus {
    pub fn from_str(s: &str) -> Self {
        match s {
            "completed" => Self::Completed,
            "delayed" => Self::Delayed,
            "cancelled" => Self::Cancelled,
            _ => Self::Active,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Delayed => "delayed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: Uuid,
    pub key_result_id: Uuid,
    pub period: String,
    pub target_value: f64,
    pub actual_value: Option<f64>,
    pub status: CheckpointStatus,
    pub notes: Option<String>,
    pub due_date: NaiveDate,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointStatus {
    Pending,
    OnTrack,
    AtRisk,
    Overdue,
    Completed,
}

impl CheckpointStatus {
    pub fn from_str(s: &str) -> Self {
        match s {
            "on_track" => Self::OnTrack,
            "at_risk" => Self::AtRisk,
            "overdue" => Self::Overdue,
            "completed" => Self::Completed,
            _ => Self::Pending,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::OnTrack => "on_track",
            Self::AtRisk => "at_risk",
            Self::Overdue => "overdue",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: Uuid,
    pub key_result_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: ActionPriority,
    pub status: ActionStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionPriority {
    Low,
    Medium,
    High,
}

impl ActionPriority {
    pub fn from_str(s: &str) -> Self {
        match s {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Todo,
    InProgress,
    Completed,
    Cancelled,
}

impl ActionStatus {
    pub fn from_str(s: &str) -> Self {
        match s {
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => Self::Todo,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkrDashboard {
    pub total_objectives: i64,
    pub completed_objectives: i64,
    pub total_key_results: i64,
    pub completed_key_results: i64,
    pub total_actions: i64,
    pub completed_actions: i64,
    pub average_progress: f64,
    pub overdue_checkpoints: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListObjectivesQuery {
    pub owner_id: Option<Uuid>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateObjectiveRequest {
    pub title: String,
    pub description: Option<String>,
    pub owner_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateObjectiveRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ObjectiveStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateKeyResultRequest {
    pub title: String,
    pub description: Option<String>,
    pub initial_value: Option<f64>,
    pub target_value: f64,
    pub unit: Option<String>,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateKeyResultRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_value: Option<f64>,
    pub current_value: Option<f64>,
    pub unit: Option<String>,
    pub status: Option<KRStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCheckpointRequest {
    pub actual_value: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateActionRequest {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<ActionPriority>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateActionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<ActionPriority>,
    pub status: Option<ActionStatus>,
}

fn parse_id(s: &str) -> Uuid {
    Uuid::parse_str(s).unwrap_or_else(|_| Uuid::nil())
}

pub fn record_to_objective(record: ObjectiveRecord) -> Objective {
    Objective {
        id: parse_id(&record.id),
        owner_id: parse_id(&record.owner_id),
        title: record.title,
        description: record.description.unwrap_or_default(),
        start_date: record.start_date,
        end_date: record.end_date,
        status: ObjectiveStatus::from_str(&record.status),
        progress: record.progress,
        created_at: record.created_at.and_utc(),
        updated_at: record.updated_at.and_utc(),
    }
}

/// Progress is derived, never trusted from storage: it is recomputed from
/// the current/target/initial values on every conversion.
pub fn record_to_key_result(record: KeyResultRecord) -> KeyResult {
    let progress = progress::key_result_progress(
        record.initial_value,
        record.target_value,
        record.current_value,
    );
    KeyResult {
        id: parse_id(&record.id),
        objective_id: parse_id(&record.objective_id),
        title: record.title,
        description: record.description,
        initial_value: record.initial_value,
        target_value: record.target_value,
        current_value: record.current_value,
        unit: record.unit,
        frequency: Frequency::parse(&record.frequency).unwrap_or(Frequency::Monthly),
        start_date: record.start_date,
        end_date: record.end_date,
        status: KRStatus::from_str(&record.status),
        progress,
        created_at: record.created_at.and_utc(),
        updated_at: record.updated_at.and_utc(),
    }
}

pub fn record_to_checkpoint(record: CheckpointRecord) -> Checkpoint {
    Checkpoint {
        id: parse_id(&record.id),
        key_result_id: parse_id(&record.key_result_id),
        period: record.period,
        target_value: record.target_value,
        actual_value: record.actual_value,
        status: CheckpointStatus::from_str(&record.status),
        notes: record.notes,
        due_date: record.due_date,
        completed_at: record.completed_at.map(|t| t.and_utc()),
        created_at: record.created_at.and_utc(),
        updated_at: record.updated_at.and_utc(),
    }
}

pub fn record_to_action(record: ActionRecord) -> Action {
    Action {
        id: parse_id(&record.id),
        key_result_id: parse_id(&record.key_result_id),
        title: record.title,
        description: record.description,
        due_date: record.due_date,
        priority: ActionPriority::from_str(&record.priority),
        status: ActionStatus::from_str(&record.status),
        completed_at: record.completed_at.map(|t| t.and_utc()),
        created_at: record.created_at.and_utc(),
        updated_at: record.updated_at.and_utc(),
    }
}
