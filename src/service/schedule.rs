use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use sqlx::SqlitePool;
use tracing::{info, instrument};

use crate::calc::schedule_hours::{
    count_scheduled_shifts_and_overtimes, hours_between, monthly_scheduled_hours,
};
use crate::db::schedules::{self, ScheduleRecord};
use crate::db::employees;
use crate::error::{Result, WorktimeError};
use crate::model::{NewSchedule, Schedule, ScheduleChange, ScheduleType, YearMonth};
use crate::utils::write_lock;

/// Recomputes the per-entry figures and copies each (employee, month)
/// total onto every entry of that group.
///
/// `month_pool` holds every entry the totals are drawn from; it may be
/// wider than `entries`.
fn fill_derived(entries: &mut [Schedule], month_pool: &[Schedule]) {
    let mut totals: HashMap<(i64, YearMonth), f64> = HashMap::new();

    for entry in entries.iter_mut() {
        let key = (entry.employee_id, YearMonth::of(entry.scheduled_date));
        let total = *totals.entry(key).or_insert_with(|| {
            monthly_scheduled_hours(
                month_pool.iter().filter(|s| s.employee_id == key.0),
                key.1,
            )
        });

        entry.scheduled_hours = hours_between(entry.start_time, entry.end_time);
        entry.scheduled_monthly_hours = total;
        entry.scheduled_work_days =
            count_scheduled_shifts_and_overtimes(std::slice::from_ref(entry));
    }
}

fn record_for(
    scheduled_date: NaiveDate,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    schedule_type: ScheduleType,
) -> ScheduleRecord {
    let start_time = start_time.unwrap_or(NaiveTime::MIN);
    let end_time = end_time.unwrap_or(NaiveTime::MIN);
    let counted = schedule_type.is_work()
        && start_time != NaiveTime::MIN
        && end_time != NaiveTime::MIN;

    ScheduleRecord {
        scheduled_date,
        start_time,
        end_time,
        schedule_type,
        scheduled_hours: hours_between(start_time, end_time),
        scheduled_work_days: i64::from(counted),
    }
}

pub async fn schedules_for_month(pool: &SqlitePool, month: YearMonth) -> Result<Vec<Schedule>> {
    let mut conn = pool.acquire().await?;
    let mut list =
        schedules::list_for_range(&mut conn, None, month.first_day(), month.last_day()).await?;

    let pool_copy = list.clone();
    fill_derived(&mut list, &pool_copy);
    Ok(list)
}

pub async fn schedules_for_employee(pool: &SqlitePool, employee_id: i64) -> Result<Vec<Schedule>> {
    let mut conn = pool.acquire().await?;
    let mut list = schedules::list_for_employee(&mut conn, employee_id).await?;

    let pool_copy = list.clone();
    fill_derived(&mut list, &pool_copy);
    Ok(list)
}

/// Entries of one date; monthly totals still cover the whole month.
pub async fn schedules_for_date(pool: &SqlitePool, date: NaiveDate) -> Result<Vec<Schedule>> {
    let month = YearMonth::of(date);
    let mut conn = pool.acquire().await?;
    let month_entries =
        schedules::list_for_range(&mut conn, None, month.first_day(), month.last_day()).await?;

    let mut list: Vec<Schedule> = month_entries
        .iter()
        .filter(|s| s.scheduled_date == date)
        .cloned()
        .collect();
    fill_derived(&mut list, &month_entries);
    Ok(list)
}

#[instrument(skip(pool))]
pub async fn create_schedule(
    pool: &SqlitePool,
    employee_id: i64,
    new_schedule: NewSchedule,
) -> Result<Schedule> {
    let _writer = write_lock::acquire().await;
    let mut tx = pool.begin().await?;
    employees::get_employee(&mut tx, employee_id).await?;

    let record = record_for(
        new_schedule.scheduled_date,
        new_schedule.start_time,
        new_schedule.end_time,
        new_schedule.schedule_type,
    );
    let mut schedule = schedules::insert_schedule(&mut tx, employee_id, &record).await?;

    let month = YearMonth::of(schedule.scheduled_date);
    let month_entries = schedules::list_for_range(
        &mut tx,
        Some(employee_id),
        month.first_day(),
        month.last_day(),
    )
    .await?;
    tx.commit().await?;

    fill_derived(std::slice::from_mut(&mut schedule), &month_entries);
    info!(employee_id, schedule_id = schedule.id, "Schedule created");
    Ok(schedule)
}

/// Replaces times and type of an existing entry; its date stays.
#[instrument(skip(pool))]
pub async fn update_schedule(
    pool: &SqlitePool,
    schedule_id: i64,
    change: ScheduleChange,
) -> Result<Schedule> {
    let _writer = write_lock::acquire().await;
    let mut tx = pool.begin().await?;
    let existing = schedules::find_schedule(&mut tx, schedule_id)
        .await?
        .ok_or_else(|| WorktimeError::invalid(format!("schedule {schedule_id} does not exist")))?;

    let record = record_for(
        existing.scheduled_date,
        change.start_time,
        change.end_time,
        change.schedule_type,
    );
    schedules::update_schedule(&mut tx, schedule_id, &record).await?;

    let month = YearMonth::of(existing.scheduled_date);
    let month_entries = schedules::list_for_range(
        &mut tx,
        Some(existing.employee_id),
        month.first_day(),
        month.last_day(),
    )
    .await?;
    tx.commit().await?;

    let mut schedule = Schedule {
        start_time: record.start_time,
        end_time: record.end_time,
        schedule_type: record.schedule_type,
        ..existing
    };
    fill_derived(std::slice::from_mut(&mut schedule), &month_entries);

    info!(schedule_id, "Schedule updated");
    Ok(schedule)
}

#[instrument(skip(pool))]
pub async fn delete_schedule(pool: &SqlitePool, schedule_id: i64) -> Result<()> {
    let _writer = write_lock::acquire().await;
    let mut conn = pool.acquire().await?;
    if schedules::delete_schedule(&mut conn, schedule_id).await? == 0 {
        return Err(WorktimeError::invalid(format!(
            "schedule {schedule_id} does not exist"
        )));
    }

    info!(schedule_id, "Schedule deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{date, employee, memory_pool, time};

    fn shift(day: NaiveDate, from: u32, to: u32) -> NewSchedule {
        NewSchedule {
            scheduled_date: day,
            start_time: Some(time(from, 0)),
            end_time: Some(time(to, 0)),
            schedule_type: ScheduleType::Shift,
        }
    }

    #[tokio::test]
    async fn create_stores_derived_figures() {
        let pool = memory_pool().await;
        let e = employee(&pool, "quinn").await;

        let night = create_schedule(&pool, e.id, shift(date(2025, 3, 3), 22, 6))
            .await
            .unwrap();
        assert_eq!(night.scheduled_hours, 8.0);
        assert_eq!(night.scheduled_work_days, 1);
        assert_eq!(night.scheduled_monthly_hours, 8.0);

        let off = create_schedule(
            &pool,
            e.id,
            NewSchedule {
                scheduled_date: date(2025, 3, 4),
                start_time: None,
                end_time: None,
                schedule_type: ScheduleType::DayOff,
            },
        )
        .await
        .unwrap();
        assert_eq!(off.scheduled_hours, 0.0);
        assert_eq!(off.scheduled_work_days, 0);
        assert_eq!(off.scheduled_monthly_hours, 8.0);
    }

    #[tokio::test]
    async fn create_for_unknown_employee_is_not_found() {
        let pool = memory_pool().await;
        assert!(matches!(
            create_schedule(&pool, 77, shift(date(2025, 3, 3), 8, 16)).await,
            Err(WorktimeError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn month_totals_fan_out_per_employee() {
        let pool = memory_pool().await;
        let a = employee(&pool, "rae").await;
        let b = employee(&pool, "sol").await;

        create_schedule(&pool, a.id, shift(date(2025, 3, 3), 8, 16)).await.unwrap();
        create_schedule(&pool, a.id, shift(date(2025, 3, 4), 8, 12)).await.unwrap();
        create_schedule(&pool, b.id, shift(date(2025, 3, 4), 9, 15)).await.unwrap();
        create_schedule(&pool, a.id, shift(date(2025, 4, 1), 8, 16)).await.unwrap();

        let march = schedules_for_month(&pool, YearMonth::new(2025, 3).unwrap())
            .await
            .unwrap();
        assert_eq!(march.len(), 3);
        for s in &march {
            let expected = if s.employee_id == a.id { 12.0 } else { 6.0 };
            assert_eq!(s.scheduled_monthly_hours, expected);
        }

        let all_of_a = schedules_for_employee(&pool, a.id).await.unwrap();
        assert_eq!(all_of_a.len(), 3);
        let april = all_of_a
            .iter()
            .find(|s| s.scheduled_date == date(2025, 4, 1))
            .unwrap();
        assert_eq!(april.scheduled_monthly_hours, 8.0);

        // totals span the month even though only one date is listed
        let on_day = schedules_for_date(&pool, date(2025, 3, 4)).await.unwrap();
        assert_eq!(on_day.len(), 2);
        let of_a = on_day.iter().find(|s| s.employee_id == a.id).unwrap();
        assert_eq!(of_a.scheduled_hours, 4.0);
        assert_eq!(of_a.scheduled_monthly_hours, 12.0);
    }

    #[tokio::test]
    async fn update_and_delete_by_id() {
        let pool = memory_pool().await;
        let e = employee(&pool, "tam").await;
        let s = create_schedule(&pool, e.id, shift(date(2025, 3, 3), 8, 16)).await.unwrap();

        let changed = update_schedule(
            &pool,
            s.id,
            ScheduleChange {
                start_time: Some(time(10, 0)),
                end_time: Some(time(14, 30)),
                schedule_type: ScheduleType::Overtime,
            },
        )
        .await
        .unwrap();
        assert_eq!(changed.scheduled_date, date(2025, 3, 3));
        assert_eq!(changed.scheduled_hours, 4.5);
        assert_eq!(changed.scheduled_monthly_hours, 4.5);
        assert_eq!(changed.schedule_type, ScheduleType::Overtime);

        let listed = schedules_for_employee(&pool, e.id).await.unwrap();
        assert_eq!(listed[0].start_time, time(10, 0));

        delete_schedule(&pool, s.id).await.unwrap();
        assert!(matches!(
            delete_schedule(&pool, s.id).await,
            Err(WorktimeError::InvalidArgument(_))
        ));
        assert!(matches!(
            update_schedule(
                &pool,
                s.id,
                ScheduleChange {
                    start_time: None,
                    end_time: None,
                    schedule_type: ScheduleType::DayOff,
                },
            )
            .await,
            Err(WorktimeError::InvalidArgument(_))
        ));
    }
}
