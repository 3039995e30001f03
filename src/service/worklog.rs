use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{info, instrument};

use super::reconcile::reconcile_in;
use crate::calc::schedule_hours::hours_between;
use crate::db::{employees, reports, schedules, worklogs};
use crate::error::Result;
use crate::model::{DailyFigure, MonthlySummary, Schedule, WorklogRow, WorklogScope};
use crate::utils::{month_locks, write_lock};

/// Rebuilds the worklog rows of `scope` from scratch and returns them.
///
/// Every employee in scope is reconciled first, then all stored worklog rows
/// of the period are replaced by one row per schedule entry. Reconciliation,
/// delete and insert share one transaction, so readers see either the old
/// period or the new one.
#[instrument(skip(pool))]
pub async fn project_worklogs(pool: &SqlitePool, scope: WorklogScope) -> Result<Vec<WorklogRow>> {
    let month = scope.month();
    let (from, to) = scope.date_range();
    let only_employee = scope.employee_id();

    let employee_ids = match only_employee {
        Some(id) => vec![id],
        None => {
            let mut conn = pool.acquire().await?;
            employees::list_employee_ids(&mut conn).await?
        }
    };

    let _guards =
        month_locks::lock_all(employee_ids.iter().map(|id| (*id, month)).collect()).await;
    let _writer = write_lock::acquire().await;
    let mut tx = pool.begin().await?;

    for employee_id in &employee_ids {
        reconcile_in(&mut tx, *employee_id, month).await?;
    }

    let names: HashMap<i64, String> = employees::list_employees(&mut tx)
        .await?
        .into_iter()
        .map(|e| (e.id, e.full_name))
        .collect();
    let entries = schedules::list_for_range(&mut tx, only_employee, from, to).await?;
    let daily: HashMap<(i64, NaiveDate), DailyFigure> =
        reports::daily_figures_for_month(&mut tx, only_employee, month)
            .await?
            .into_iter()
            .map(|d| ((d.employee_id, d.date), d))
            .collect();
    let summaries: HashMap<i64, MonthlySummary> =
        reports::summaries_for_month(&mut tx, only_employee, month)
            .await?
            .into_iter()
            .map(|s| (s.employee_id, s))
            .collect();

    let removed = worklogs::delete_range(&mut tx, only_employee, from, to).await?;

    let rows: Vec<WorklogRow> = entries
        .iter()
        .map(|entry| {
            build_row(
                entry,
                names.get(&entry.employee_id),
                daily.get(&(entry.employee_id, entry.scheduled_date)),
                summaries.get(&entry.employee_id),
            )
        })
        .collect();

    let inserted = worklogs::insert_many(&mut tx, &rows).await?;
    tx.commit().await?;

    info!(
        employees = employee_ids.len(),
        removed,
        inserted,
        "Worklogs rebuilt"
    );
    Ok(rows)
}

/// Reads the stored projection of `scope` without rebuilding it.
pub async fn stored_worklogs(pool: &SqlitePool, scope: WorklogScope) -> Result<Vec<WorklogRow>> {
    let (from, to) = scope.date_range();
    let mut conn = pool.acquire().await?;
    worklogs::list_range(&mut conn, scope.employee_id(), from, to).await
}

/// Joins one schedule entry with its day's and month's figures. Hours are
/// narrowed to whole numbers, truncating toward zero.
fn build_row(
    entry: &Schedule,
    full_name: Option<&String>,
    daily: Option<&DailyFigure>,
    summary: Option<&MonthlySummary>,
) -> WorklogRow {
    WorklogRow {
        employee_id: entry.employee_id,
        full_name: full_name.cloned().unwrap_or_default(),
        scheduled_date: entry.scheduled_date,
        schedule_type: entry.schedule_type,
        work_hours: daily.map_or(0, |d| d.work_hours as i64),
        overtime_hours: daily.map_or(0, |d| d.overtime_hours as i64),
        scheduled_hours: hours_between(entry.start_time, entry.end_time) as i64,
        scheduled_work_days: entry.scheduled_work_days,
        monthly_work_days: summary.map_or(0, |s| s.monthly_work_days),
        monthly_overtime_hours: summary.map_or(0, |s| s.monthly_overtime_hours as i64),
    }
}
