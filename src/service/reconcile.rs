use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, instrument};

use crate::calc::checkpoint_hours::{group_by_check_in_date, monthly_work_hours, work_hours_for_checkpoint};
use crate::calc::overtime::monthly_overtime_from_totals;
use crate::calc::schedule_hours::hours_between;
use crate::db::{checkpoints, employees, reports, schedules};
use crate::error::Result;
use crate::model::{DailyFigure, MonthlySummary, YearMonth};
use crate::utils::{month_locks, write_lock};

/// Re-derives one employee's daily figures and monthly summary from the
/// stored checkpoints and schedules, and commits them as one unit.
///
/// Returns the daily figures; the summary is stored but not returned.
/// Running it again without data changes leaves the stored rows identical.
#[instrument(skip(pool, month), fields(month = %month))]
pub async fn reconcile_month(
    pool: &SqlitePool,
    employee_id: i64,
    month: YearMonth,
) -> Result<Vec<DailyFigure>> {
    let _guard = month_locks::lock(employee_id, month).await;
    let _writer = write_lock::acquire().await;

    let mut tx = pool.begin().await?;
    let daily = reconcile_in(&mut tx, employee_id, month).await?;
    tx.commit().await?;

    info!(employee_id, days = daily.len(), "Month reconciled");
    Ok(daily)
}

/// Reconciliation on a caller-owned transaction. The caller holds the
/// `(employee_id, month)` lock.
pub(crate) async fn reconcile_in(
    conn: &mut SqliteConnection,
    employee_id: i64,
    month: YearMonth,
) -> Result<Vec<DailyFigure>> {
    employees::get_employee(&mut *conn, employee_id).await?;

    let completed =
        checkpoints::list_completed_for_employee_month(&mut *conn, employee_id, month).await?;
    let days = group_by_check_in_date(&completed, month);

    let mut daily = Vec::with_capacity(days.len());
    let mut monthly_overtime = 0.0;

    for (date, sessions) in &days {
        let work_hours: f64 = sessions.iter().map(|cp| work_hours_for_checkpoint(cp)).sum();
        let work_day = i64::from(work_hours > 0.0);

        let scheduled_hours: f64 = schedules::list_for_employee_date(&mut *conn, employee_id, *date)
            .await?
            .iter()
            .map(|s| hours_between(s.start_time, s.end_time))
            .sum();

        // floored per day, unlike the signed schedule rule
        let overtime = monthly_overtime_from_totals(work_hours, scheduled_hours);
        monthly_overtime += overtime;

        let figure = DailyFigure {
            employee_id,
            date: *date,
            report_month: month.first_day(),
            work_hours,
            overtime_hours: overtime,
            work_day,
        };
        reports::upsert_daily_figure(&mut *conn, &figure).await?;
        daily.push(figure);
    }

    let worked_dates: Vec<NaiveDate> = days.keys().copied().collect();
    let stale =
        reports::delete_daily_figures_except(&mut *conn, employee_id, month, &worked_dates).await?;
    if stale > 0 {
        debug!(employee_id, stale, "Removed daily figures without sessions");
    }

    let summary = MonthlySummary {
        employee_id,
        report_month: month.first_day(),
        monthly_work_hours: monthly_work_hours(&completed, month),
        monthly_overtime_hours: monthly_overtime,
        monthly_work_days: daily.iter().map(|d| d.work_day).sum(),
    };
    reports::upsert_monthly_summary(&mut *conn, &summary).await?;

    Ok(daily)
}
