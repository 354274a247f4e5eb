//! Database rows and schema for the OKR tables.
//!
//! Column types are kept to the subset every supported backend understands:
//! Text keys, Double numerics, Date / Timestamp temporals. Ids are UUIDs
//! serialized as text; timestamps are naive UTC.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

pub mod schema {
    diesel::table! {
        objectives (id) {
            id -> Text,
            owner_id -> Text,
            title -> Text,
            description -> Nullable<Text>,
            start_date -> Date,
            end_date -> Date,
            status -> Text,
            progress -> Double,
            created_at -> Timestamp,
            updated_at -> Timestamp,
        }
    }

    diesel::table! {
        key_results (id) {
            id -> Text,
            objective_id -> Text,
            title -> Text,
            description -> Nullable<Text>,
            initial_value -> Double,
            target_value -> Double,
            current_value -> Double,
            unit -> Nullable<Text>,
            frequency -> Text,
            start_date -> Date,
            end_date -> Date,
            status -> Text,
            progress -> Double,
            created_at -> Timestamp,
            updated_at -> Timestamp,
        }
    }

    diesel::table! {
        checkpoints (id) {
            id -> Text,
            key_result_id -> Text,
            period -> Text,
            target_value -> Double,
            actual_value -> Nullable<Double>,
            status -> Text,
            notes -> Nullable<Text>,
            due_date -> Date,
            completed_at -> Nullable<Timestamp>,
            created_at -> Timestamp,
            updated_at -> Timestamp,
        }
    }

    diesel::table! {
        actions (id) {
            id -> Text,
            key_result_id -> Text,
            title -> Text,
            description -> Nullable<Text>,
            due_date -> Nullable<Date>,
            priority -> Text,
            status -> Text,
            completed_at -> Nullable<Timestamp>,
            created_at -> Timestamp,
            updated_at -> Timestamp,
        }
    }

    diesel::joinable!(key_results -> objectives (objective_id));
    diesel::joinable!(checkpoints -> key_results (key_result_id));
    diesel::joinable!(actions -> key_results (key_result_id));
    diesel::allow_tables_to_appear_in_same_query!(objectives, key_results, checkpoints, actions);
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::objectives)]
pub struct ObjectiveRecord {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub progress: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::key_results)]
pub struct KeyResultRecord {
    pub id: String,
    pub objective_id: String,
    pub title: String,
    pub description: Option<String>,
    pub initial_value: f64,
    pub target_value: f64,
    pub current_value: f64,
    pub unit: Option<String>,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub progress: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::checkpoints, treat_none_as_null = true)]
pub struct CheckpointRecord {
    pub id: String,
    pub key_result_id: String,
    pub period: String,
    pub target_value: f64,
    pub actual_value: Option<f64>,
    pub status: String,
    pub notes: Option<String>,
    pub due_date: NaiveDate,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = schema::actions, treat_none_as_null = true)]
pub struct ActionRecord {
    pub id: String,
    pub key_result_id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: String,
    pub status: String,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
