use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};

use super::reconcile::reconcile_in;
use crate::calc::checkpoint_hours::{monthly_work_days, monthly_work_hours};
use crate::db::{checkpoints, employees};
use crate::error::{Result, WorktimeError};
use crate::model::{Checkpoint, CheckpointPatch, NewCheckpoint, SessionStatus, YearMonth};
use crate::utils::{month_locks, write_lock};

/// Month totals derived straight from the sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckpointTotals {
    pub employee_id: i64,
    pub month: YearMonth,
    pub work_hours: f64,
    pub work_days: i64,
}

/// Opens a session. Fails while the previous one is still open.
#[instrument(skip(pool))]
pub async fn check_in(pool: &SqlitePool, employee_id: i64, at: NaiveDateTime) -> Result<Checkpoint> {
    let _writer = write_lock::acquire().await;
    let mut tx = pool.begin().await?;
    employees::get_employee(&mut tx, employee_id).await?;

    if let Some(latest) = checkpoints::latest_for_employee(&mut tx, employee_id).await? {
        if SessionStatus::from_times(latest.check_in_time, latest.check_out_time)
            == SessionStatus::Active
        {
            warn!(employee_id, checkpoint_id = latest.id, "Check-in while session open");
            return Err(WorktimeError::invalid("already checked in"));
        }
    }

    let checkpoint = checkpoints::insert_checkpoint(&mut tx, employee_id, Some(at), None).await?;
    tx.commit().await?;

    info!(employee_id, checkpoint_id = checkpoint.id, "Checked in");
    Ok(checkpoint)
}

/// Closes the open session and refreshes the report of its check-in month.
/// Both land in one transaction; a failed refresh leaves the session open.
#[instrument(skip(pool))]
pub async fn check_out(pool: &SqlitePool, employee_id: i64, at: NaiveDateTime) -> Result<Checkpoint> {
    let open = {
        let mut conn = pool.acquire().await?;
        employees::get_employee(&mut conn, employee_id).await?;
        checkpoints::latest_for_employee(&mut conn, employee_id).await?
    };
    let open = match open {
        Some(cp) if SessionStatus::from_times(cp.check_in_time, cp.check_out_time) == SessionStatus::Active => cp,
        _ => return Err(WorktimeError::invalid("no open session to check out")),
    };

    let check_in = open
        .check_in_time
        .ok_or_else(|| WorktimeError::invalid("session has no check-in time"))?;
    if at < check_in {
        return Err(WorktimeError::invalid("check-out precedes check-in"));
    }
    let month = YearMonth::of(check_in.date());

    let _guard = month_locks::lock(employee_id, month).await;
    let _writer = write_lock::acquire().await;
    let mut tx = pool.begin().await?;

    // closed by someone else while we waited
    let mut checkpoint = checkpoints::find_checkpoint(&mut tx, employee_id, open.id)
        .await?
        .filter(|cp| cp.check_out_time.is_none())
        .ok_or_else(|| WorktimeError::invalid("no open session to check out"))?;

    checkpoint.check_out_time = Some(at);
    checkpoint.session_status = SessionStatus::Inactive;
    checkpoints::save_times(&mut tx, &checkpoint).await?;
    reconcile_in(&mut tx, employee_id, month).await?;
    tx.commit().await?;

    info!(employee_id, checkpoint_id = checkpoint.id, "Checked out");
    Ok(checkpoint)
}

/// Manual entry of a session; the check-in time is mandatory.
#[instrument(skip(pool))]
pub async fn create_checkpoint(pool: &SqlitePool, new_checkpoint: NewCheckpoint) -> Result<Checkpoint> {
    let check_in = new_checkpoint
        .check_in_time
        .ok_or_else(|| WorktimeError::invalid("check-in time is required"))?;
    let employee_id = new_checkpoint.employee_id;
    let month = YearMonth::of(check_in.date());

    let _guard = month_locks::lock(employee_id, month).await;
    let _writer = write_lock::acquire().await;
    let mut tx = pool.begin().await?;

    employees::get_employee(&mut tx, employee_id).await?;
    let checkpoint = checkpoints::insert_checkpoint(
        &mut tx,
        employee_id,
        Some(check_in),
        new_checkpoint.check_out_time,
    )
    .await?;
    reconcile_in(&mut tx, employee_id, month).await?;
    tx.commit().await?;

    Ok(checkpoint)
}

/// Check-in months of a session before and after an edit.
fn touched_months(before: &Checkpoint, new_check_in: Option<NaiveDateTime>) -> Vec<YearMonth> {
    let mut months: Vec<YearMonth> = before
        .check_in_time
        .into_iter()
        .chain(new_check_in)
        .map(|t| YearMonth::of(t.date()))
        .collect();
    months.sort();
    months.dedup();
    months
}

async fn load_checkpoint(pool: &SqlitePool, employee_id: i64, checkpoint_id: i64) -> Result<Checkpoint> {
    let mut conn = pool.acquire().await?;
    checkpoints::find_checkpoint(&mut conn, employee_id, checkpoint_id)
        .await?
        .ok_or_else(|| missing_checkpoint(employee_id, checkpoint_id))
}

fn missing_checkpoint(employee_id: i64, checkpoint_id: i64) -> WorktimeError {
    WorktimeError::not_found(format!("checkpoint {checkpoint_id} of employee {employee_id}"))
}

/// Corrects a past or current session. A supplied check-out closes it.
/// Reports of the old and the new check-in month are refreshed.
#[instrument(skip(pool))]
pub async fn update_checkpoint(
    pool: &SqlitePool,
    employee_id: i64,
    checkpoint_id: i64,
    patch: CheckpointPatch,
) -> Result<Checkpoint> {
    let before = load_checkpoint(pool, employee_id, checkpoint_id).await?;
    let months = touched_months(&before, patch.check_in_time);

    let _guards =
        month_locks::lock_all(months.iter().map(|m| (employee_id, *m)).collect()).await;
    let _writer = write_lock::acquire().await;
    let mut tx = pool.begin().await?;

    let mut checkpoint = checkpoints::find_checkpoint(&mut tx, employee_id, checkpoint_id)
        .await?
        .ok_or_else(|| missing_checkpoint(employee_id, checkpoint_id))?;

    if let Some(check_in) = patch.check_in_time {
        checkpoint.check_in_time = Some(check_in);
    }
    match patch.check_out_time {
        Some(check_out) => {
            checkpoint.check_out_time = Some(check_out);
            checkpoint.session_status = SessionStatus::Inactive;
        }
        None => {
            checkpoint.session_status =
                SessionStatus::from_times(checkpoint.check_in_time, checkpoint.check_out_time);
        }
    }

    checkpoints::save_times(&mut tx, &checkpoint).await?;
    for month in &months {
        reconcile_in(&mut tx, employee_id, *month).await?;
    }
    tx.commit().await?;

    info!(employee_id, checkpoint_id, "Checkpoint updated");
    Ok(checkpoint)
}

#[instrument(skip(pool))]
pub async fn delete_checkpoint(pool: &SqlitePool, employee_id: i64, checkpoint_id: i64) -> Result<()> {
    let before = load_checkpoint(pool, employee_id, checkpoint_id).await?;
    let months = touched_months(&before, None);

    let _guards =
        month_locks::lock_all(months.iter().map(|m| (employee_id, *m)).collect()).await;
    let _writer = write_lock::acquire().await;
    let mut tx = pool.begin().await?;

    if checkpoints::delete_checkpoint(&mut tx, employee_id, checkpoint_id).await? == 0 {
        return Err(missing_checkpoint(employee_id, checkpoint_id));
    }
    for month in &months {
        reconcile_in(&mut tx, employee_id, *month).await?;
    }
    tx.commit().await?;

    info!(employee_id, checkpoint_id, "Checkpoint deleted");
    Ok(())
}

/// Statuses are re-derived from the times rather than trusted from storage.
fn with_derived_status(mut list: Vec<Checkpoint>) -> Vec<Checkpoint> {
    for cp in &mut list {
        cp.session_status = SessionStatus::from_times(cp.check_in_time, cp.check_out_time);
    }
    list
}

pub async fn checkpoints_for_month(pool: &SqlitePool, month: YearMonth) -> Result<Vec<Checkpoint>> {
    let mut conn = pool.acquire().await?;
    Ok(with_derived_status(
        checkpoints::list_for_month(&mut conn, month).await?,
    ))
}

pub async fn checkpoints_for_employee(
    pool: &SqlitePool,
    employee_id: i64,
    month: YearMonth,
) -> Result<Vec<Checkpoint>> {
    let mut conn = pool.acquire().await?;
    Ok(with_derived_status(
        checkpoints::list_for_employee_month(&mut conn, employee_id, month).await?,
    ))
}

/// Status of the latest session; no sessions at all is `Inactive`.
pub async fn session_status(pool: &SqlitePool, employee_id: i64) -> Result<SessionStatus> {
    let mut conn = pool.acquire().await?;
    let status = checkpoints::latest_for_employee(&mut conn, employee_id)
        .await?
        .map_or(SessionStatus::Inactive, |cp| {
            SessionStatus::from_times(cp.check_in_time, cp.check_out_time)
        });

    Ok(status)
}

pub async fn monthly_totals(
    pool: &SqlitePool,
    employee_id: i64,
    month: YearMonth,
) -> Result<CheckpointTotals> {
    let list = checkpoints_for_employee(pool, employee_id, month).await?;

    Ok(CheckpointTotals {
        employee_id,
        month,
        work_hours: monthly_work_hours(&list, month),
        work_days: monthly_work_days(&list, month),
    })
}
