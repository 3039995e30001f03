use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{info, instrument};

use super::reconcile::{reconcile_in, reconcile_month};
use crate::calc::overtime::{monthly_overtime_from_per_day, overtime_per_day};
use crate::db::{employees, reports, schedules};
use crate::error::Result;
use crate::model::{EmployeeMonthReport, ScheduleBalance, YearMonth};
use crate::utils::{month_locks, write_lock};

/// Reconciles every employee for `month` and returns their figures.
#[instrument(skip(pool, month), fields(month = %month))]
pub async fn reports_for_month(
    pool: &SqlitePool,
    month: YearMonth,
) -> Result<Vec<EmployeeMonthReport>> {
    let staff = {
        let mut conn = pool.acquire().await?;
        employees::list_employees(&mut conn).await?
    };

    let _guards = month_locks::lock_all(staff.iter().map(|e| (e.id, month)).collect()).await;
    let _writer = write_lock::acquire().await;
    let mut tx = pool.begin().await?;

    for employee in &staff {
        reconcile_in(&mut tx, employee.id, month).await?;
    }

    let mut daily_by_employee: HashMap<i64, Vec<_>> = HashMap::new();
    for figure in reports::daily_figures_for_month(&mut tx, None, month).await? {
        daily_by_employee.entry(figure.employee_id).or_default().push(figure);
    }
    let mut summaries: HashMap<i64, _> = reports::summaries_for_month(&mut tx, None, month)
        .await?
        .into_iter()
        .map(|s| (s.employee_id, s))
        .collect();
    tx.commit().await?;

    let result: Vec<EmployeeMonthReport> = staff
        .into_iter()
        .map(|employee| EmployeeMonthReport {
            daily: daily_by_employee.remove(&employee.id).unwrap_or_default(),
            summary: summaries.remove(&employee.id),
            employee_id: employee.id,
            full_name: employee.full_name,
            report_month: month.first_day(),
        })
        .collect();

    info!(employees = result.len(), "Monthly reports ready");
    Ok(result)
}

/// One report per month in which the employee has schedule entries,
/// oldest first.
#[instrument(skip(pool))]
pub async fn reports_for_employee(
    pool: &SqlitePool,
    employee_id: i64,
) -> Result<Vec<EmployeeMonthReport>> {
    let (employee, months) = {
        let mut conn = pool.acquire().await?;
        let employee = employees::get_employee(&mut conn, employee_id).await?;
        let months: BTreeSet<YearMonth> = schedules::list_for_employee(&mut conn, employee_id)
            .await?
            .iter()
            .map(|s| YearMonth::of(s.scheduled_date))
            .collect();
        (employee, months)
    };

    let mut result = Vec::with_capacity(months.len());
    for month in months {
        let daily = reconcile_month(pool, employee_id, month).await?;
        let summary = {
            let mut conn = pool.acquire().await?;
            reports::summaries_for_month(&mut conn, Some(employee_id), month)
                .await?
                .into_iter()
                .next()
        };

        result.push(EmployeeMonthReport {
            employee_id,
            full_name: employee.full_name.clone(),
            report_month: month.first_day(),
            daily,
            summary,
        });
    }

    Ok(result)
}

/// Signed overtime of each scheduled day in `month`, measured against the
/// reconciled work hours. Scheduled days without work count negative.
#[instrument(skip(pool, month), fields(month = %month))]
pub async fn schedule_balance(
    pool: &SqlitePool,
    employee_id: i64,
    month: YearMonth,
) -> Result<ScheduleBalance> {
    let daily = reconcile_month(pool, employee_id, month).await?;
    let work_hours: BTreeMap<NaiveDate, f64> =
        daily.iter().map(|d| (d.date, d.work_hours)).collect();

    let entries = {
        let mut conn = pool.acquire().await?;
        schedules::list_for_range(
            &mut conn,
            Some(employee_id),
            month.first_day(),
            month.last_day(),
        )
        .await?
    };

    Ok(ScheduleBalance {
        employee_id,
        report_month: month.first_day(),
        per_day: overtime_per_day(&entries, &work_hours),
        monthly_total: monthly_overtime_from_per_day(&entries, &work_hours, month),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::checkpoints;
    use crate::db::schedules::ScheduleRecord;
    use crate::db::test_support::{at, date, employee, memory_pool, time};
    use crate::error::WorktimeError;
    use crate::model::ScheduleType;

    async fn session(pool: &SqlitePool, employee_id: i64, day: NaiveDate, from: u32, to: u32) {
        let mut conn = pool.acquire().await.unwrap();
        checkpoints::insert_checkpoint(
            &mut conn,
            employee_id,
            Some(at(day, from, 0)),
            Some(at(day, to, 0)),
        )
        .await
        .unwrap();
    }

    async fn shift(pool: &SqlitePool, employee_id: i64, day: NaiveDate, from: u32, to: u32) {
        let mut conn = pool.acquire().await.unwrap();
        let record = ScheduleRecord {
            scheduled_date: day,
            start_time: time(from, 0),
            end_time: time(to, 0),
            schedule_type: ScheduleType::Shift,
            scheduled_hours: f64::from(to - from),
            scheduled_work_days: 1,
        };
        schedules::insert_schedule(&mut conn, employee_id, &record).await.unwrap();
    }

    fn march() -> YearMonth {
        YearMonth::new(2025, 3).unwrap()
    }

    #[tokio::test]
    async fn month_reports_cover_every_employee() {
        let pool = memory_pool().await;
        let busy = employee(&pool, "uma").await;
        let idle = employee(&pool, "vik").await;
        session(&pool, busy.id, date(2025, 3, 3), 9, 18).await;
        shift(&pool, busy.id, date(2025, 3, 3), 9, 17).await;

        let list = reports_for_month(&pool, march()).await.unwrap();
        assert_eq!(list.len(), 2);

        let first = &list[0];
        assert_eq!(first.employee_id, busy.id);
        assert_eq!(first.full_name, "uma Tester");
        assert_eq!(first.daily.len(), 1);
        assert_eq!(first.daily[0].overtime_hours, 1.0);
        assert_eq!(first.summary.as_ref().unwrap().monthly_overtime_hours, 1.0);

        let second = &list[1];
        assert_eq!(second.employee_id, idle.id);
        assert!(second.daily.is_empty());
        assert_eq!(second.summary.as_ref().unwrap().monthly_work_days, 0);
    }

    #[tokio::test]
    async fn employee_reports_follow_scheduled_months() {
        let pool = memory_pool().await;
        let e = employee(&pool, "wen").await;
        shift(&pool, e.id, date(2025, 3, 3), 9, 17).await;
        shift(&pool, e.id, date(2025, 4, 7), 9, 17).await;
        session(&pool, e.id, date(2025, 4, 7), 9, 15).await;

        let list = reports_for_employee(&pool, e.id).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].report_month, date(2025, 3, 1));
        assert!(list[0].daily.is_empty());
        assert_eq!(list[1].report_month, date(2025, 4, 1));
        assert_eq!(list[1].daily[0].work_hours, 6.0);
        assert_eq!(list[1].summary.as_ref().unwrap().monthly_work_hours, 6.0);

        assert!(matches!(
            reports_for_employee(&pool, e.id + 100).await,
            Err(WorktimeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn balance_counts_missed_shifts_negative() {
        let pool = memory_pool().await;
        let e = employee(&pool, "xia").await;
        shift(&pool, e.id, date(2025, 3, 3), 9, 17).await;
        shift(&pool, e.id, date(2025, 3, 4), 9, 17).await;
        shift(&pool, e.id, date(2025, 3, 5), 9, 17).await;
        session(&pool, e.id, date(2025, 3, 3), 9, 19).await;
        session(&pool, e.id, date(2025, 3, 4), 9, 13).await;

        let balance = schedule_balance(&pool, e.id, march()).await.unwrap();

        assert_eq!(balance.per_day[&date(2025, 3, 3)], 2.0);
        assert_eq!(balance.per_day[&date(2025, 3, 4)], -4.0);
        assert_eq!(balance.per_day[&date(2025, 3, 5)], -8.0);
        assert_eq!(balance.monthly_total, -10.0);
    }
}
