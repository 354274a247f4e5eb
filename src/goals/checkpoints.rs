//! Checkpoint lifecycle: bulk (re)generation, progress updates and status
//! derivation.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use log::{error, info};
use uuid::Uuid;

use crate::goals::periods::{generate_periods, Period};
use crate::goals::progress;
use crate::goals::types::{
    record_to_checkpoint, Checkpoint, CheckpointStatus, Frequency, UpdateCheckpointRequest,
};
use crate::shared::error::OkrError;
use crate::shared::models::CheckpointRecord;
use crate::storage::OkrStore;

/// Share of the target below which a missed checkpoint counts as overdue
/// rather than merely at risk.
const AT_RISK_THRESHOLD: f64 = 0.85;

/// Status of a single checkpoint as of `today`.
///
/// An unrecorded checkpoint is pending until its due date passes. A recorded
/// one is completed at or above target; past its due date it is at risk when
/// it reached at least 85% of target and overdue below that; before the due
/// date it is simply on track.
pub fn derive_status(
    target_value: f64,
    actual_value: Option<f64>,
    due_date: NaiveDate,
    today: NaiveDate,
) -> CheckpointStatus {
    match actual_value {
        None => {
            if due_date < today {
                CheckpointStatus::Overdue
            } else {
                CheckpointStatus::Pending
            }
        }
        Some(actual) => {
            if actual >= target_value {
                CheckpointStatus::Completed
            } else if due_date < today {
                let ratio = if target_value > 0.0 {
                    actual / target_value
                } else {
                    1.0
                };
                if ratio >= AT_RISK_THRESHOLD {
                    CheckpointStatus::AtRisk
                } else {
                    CheckpointStatus::Overdue
                }
            } else {
                CheckpointStatus::OnTrack
            }
        }
    }
}

/// Re-derives the presented status of a stored row without persisting it,
/// so reads always reflect the calendar.
pub fn refresh_record_status(record: &mut CheckpointRecord, today: NaiveDate) {
    let status = derive_status(
        record.target_value,
        record.actual_value,
        record.due_date,
        today,
    );
    record.status = status.to_str().to_string();
}

fn checkpoint_rows(
    key_result_id: &str,
    periods: Vec<Period>,
    now: NaiveDateTime,
) -> Vec<CheckpointRecord> {
    periods
        .into_iter()
        .map(|p| CheckpointRecord {
            id: Uuid::new_v4().to_string(),
            key_result_id: key_result_id.to_string(),
            period: p.label,
            target_value: p.target_value,
            actual_value: None,
            status: CheckpointStatus::Pending.to_str().to_string(),
            notes: None,
            due_date: p.due_date,
            completed_at: None,
            created_at: now,
            updated_at: now,
        })
        .collect()
}

#[derive(Clone)]
pub struct CheckpointEngine {
    store: Arc<dyn OkrStore>,
}

impl CheckpointEngine {
    pub fn new(store: Arc<dyn OkrStore>) -> Self {
        Self { store }
    }

    /// Regenerates the checkpoint schedule for a key result. Destructive:
    /// every prior checkpoint for the key result, including any recorded
    /// actual values and notes, is replaced in a single transaction. The
    /// callers expose this behind an explicit confirmation.
    pub async fn generate_checkpoints(
        &self,
        key_result_id: Uuid,
    ) -> Result<Vec<Checkpoint>, OkrError> {
        let kr = self
            .store
            .get_key_result(key_result_id)
            .await?
            .ok_or_else(|| OkrError::NotFound(format!("Key result {key_result_id} not found")))?;

        let frequency = Frequency::parse(&kr.frequency)?;
        let periods = generate_periods(
            kr.start_date,
            kr.end_date,
            frequency,
            kr.initial_value,
            kr.target_value,
        )?;

        let now = Utc::now().naive_utc();
        let rows = checkpoint_rows(&kr.id, periods, now);
        let inserted = self.store.replace_checkpoints(key_result_id, rows).await?;

        info!(
            "Regenerated {} checkpoints for key result {} ({})",
            inserted.len(),
            kr.title,
            key_result_id
        );
        Ok(inserted.into_iter().map(record_to_checkpoint).collect())
    }

    /// Records real-world progress against one checkpoint. The only write
    /// path for actual values; it also rolls the new value up into the
    /// owning key result and its objective. The request carries the full
    /// recording: an absent `notes` clears any stored notes.
    pub async fn update_checkpoint(
        &self,
        id: Uuid,
        req: UpdateCheckpointRequest,
    ) -> Result<Checkpoint, OkrError> {
        let mut record = self
            .store
            .get_checkpoint(id)
            .await?
            .ok_or_else(|| OkrError::NotFound(format!("Checkpoint {id} not found")))?;

        let now = Utc::now();
        record.actual_value = Some(req.actual_value);
        record.notes = req.notes;
        let status = derive_status(
            record.target_value,
            record.actual_value,
            record.due_date,
            now.date_naive(),
        );
        record.completed_at = if status == CheckpointStatus::Completed {
            record.completed_at.or(Some(now.naive_utc()))
        } else {
            None
        };
        record.status = status.to_str().to_string();
        record.updated_at = now.naive_utc();

        let updated = self.store.update_checkpoint(record).await?;

        // The checkpoint row is persisted at this point; a failed roll-up is
        // logged rather than returned, so the response matches what was
        // stored. The next recording recomputes the roll-up from scratch.
        let key_result_id =
            Uuid::parse_str(&updated.key_result_id).unwrap_or_else(|_| Uuid::nil());
        if let Err(e) = self.record_progress(key_result_id, req.actual_value).await {
            error!("Checkpoint {id} saved but progress roll-up failed: {e}");
        }

        info!("Updated checkpoint {} ({})", updated.period, id);
        Ok(record_to_checkpoint(updated))
    }

    /// Recomputes the stored progress of an objective from its key results.
    pub async fn roll_up_objective(&self, objective_id: Uuid) -> Result<(), OkrError> {
        let Some(mut objective) = self.store.get_objective(objective_id).await? else {
            return Ok(());
        };
        let key_results = self.store.list_key_results(objective_id).await?;
        let values: Vec<f64> = key_results
            .iter()
            .map(|kr| {
                progress::key_result_progress(kr.initial_value, kr.target_value, kr.current_value)
            })
            .collect();
        objective.progress = progress::objective_progress(&values);
        objective.updated_at = Utc::now().naive_utc();
        self.store.update_objective(objective).await?;
        Ok(())
    }

    async fn record_progress(&self, key_result_id: Uuid, actual: f64) -> Result<(), OkrError> {
        let Some(mut kr) = self.store.get_key_result(key_result_id).await? else {
            return Ok(());
        };
        kr.current_value = actual;
        kr.progress =
            progress::key_result_progress(kr.initial_value, kr.target_value, kr.current_value);
        kr.updated_at = Utc::now().naive_utc();
        let objective_id = Uuid::parse_str(&kr.objective_id).unwrap_or_else(|_| Uuid::nil());
        self.store.update_key_result(kr).await?;
        self.roll_up_objective(objective_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn unrecorded_future_checkpoint_is_pending() {
        let status = derive_status(100.0, None, date(2024, 3, 31), date(2024, 2, 1));
        assert_eq!(status, CheckpointStatus::Pending);
    }

    #[test]
    fn unrecorded_past_checkpoint_is_overdue() {
        let status = derive_status(100.0, None, date(2024, 1, 31), date(2024, 2, 1));
        assert_eq!(status, CheckpointStatus::Overdue);
    }

    #[test]
    fn reaching_target_completes_regardless_of_dates() {
        let status = derive_status(100.0, Some(100.0), date(2024, 1, 31), date(2024, 6, 1));
        assert_eq!(status, CheckpointStatus::Completed);
        let status = derive_status(100.0, Some(120.0), date(2024, 6, 30), date(2024, 2, 1));
        assert_eq!(status, CheckpointStatus::Completed);
    }

    #[test]
    fn missed_checkpoint_splits_at_85_percent() {
        // 90 of 100 after the due date: at risk.
        let status = derive_status(100.0, Some(90.0), date(2024, 1, 31), date(2024, 2, 1));
        assert_eq!(status, CheckpointStatus::AtRisk);
        // 80 of 100 after the due date: below the threshold, overdue.
        let status = derive_status(100.0, Some(80.0), date(2024, 1, 31), date(2024, 2, 1));
        assert_eq!(status, CheckpointStatus::Overdue);
        // 85 exactly sits on the threshold and stays at risk.
        let status = derive_status(100.0, Some(85.0), date(2024, 1, 31), date(2024, 2, 1));
        assert_eq!(status, CheckpointStatus::AtRisk);
    }

    #[test]
    fn partial_progress_before_due_date_is_on_track() {
        let status = derive_status(100.0, Some(10.0), date(2024, 3, 31), date(2024, 2, 1));
        assert_eq!(status, CheckpointStatus::OnTrack);
    }
}
