use chrono::{NaiveDate, NaiveTime};
use sqlx::SqliteConnection;

use crate::error::Result;
use crate::model::{Schedule, ScheduleType};

const SCHEDULE_COLUMNS: &str = "id, employee_id, scheduled_date, start_time, end_time, \
     schedule_type, scheduled_hours, scheduled_work_days";

/// Column values of a schedule row, with the derived figures already computed.
#[derive(Debug, Clone)]
pub struct ScheduleRecord {
    pub scheduled_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub schedule_type: ScheduleType,
    pub scheduled_hours: f64,
    pub scheduled_work_days: i64,
}

pub async fn insert_schedule(
    conn: &mut SqliteConnection,
    employee_id: i64,
    record: &ScheduleRecord,
) -> Result<Schedule> {
    let id = sqlx::query(
        r#"
        INSERT INTO schedules
        (employee_id, scheduled_date, start_time, end_time, schedule_type,
         scheduled_hours, scheduled_work_days)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(record.scheduled_date)
    .bind(record.start_time)
    .bind(record.end_time)
    .bind(record.schedule_type)
    .bind(record.scheduled_hours)
    .bind(record.scheduled_work_days)
    .execute(conn)
    .await?
    .last_insert_rowid();

    Ok(Schedule {
        id,
        employee_id,
        scheduled_date: record.scheduled_date,
        start_time: record.start_time,
        end_time: record.end_time,
        schedule_type: record.schedule_type,
        scheduled_hours: record.scheduled_hours,
        scheduled_monthly_hours: 0.0,
        scheduled_work_days: record.scheduled_work_days,
    })
}

pub async fn find_schedule(conn: &mut SqliteConnection, id: i64) -> Result<Option<Schedule>> {
    let schedule = sqlx::query_as::<_, Schedule>(&format!(
        "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(schedule)
}

/// Overwrites times, type and derived figures; the date stays put.
pub async fn update_schedule(
    conn: &mut SqliteConnection,
    id: i64,
    record: &ScheduleRecord,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE schedules
        SET start_time = ?, end_time = ?, schedule_type = ?,
            scheduled_hours = ?, scheduled_work_days = ?
        WHERE id = ?
        "#,
    )
    .bind(record.start_time)
    .bind(record.end_time)
    .bind(record.schedule_type)
    .bind(record.scheduled_hours)
    .bind(record.scheduled_work_days)
    .bind(id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete_schedule(conn: &mut SqliteConnection, id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM schedules WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

/// Entries dated within `[from, to]`, optionally for one employee.
pub async fn list_for_range(
    conn: &mut SqliteConnection,
    employee_id: Option<i64>,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<Schedule>> {
    let schedules = sqlx::query_as::<_, Schedule>(&format!(
        r#"
        SELECT {SCHEDULE_COLUMNS}
        FROM schedules
        WHERE scheduled_date >= ? AND scheduled_date <= ?
          AND (? IS NULL OR employee_id = ?)
        ORDER BY scheduled_date, employee_id, id
        "#
    ))
    .bind(from)
    .bind(to)
    .bind(employee_id)
    .bind(employee_id)
    .fetch_all(conn)
    .await?;

    Ok(schedules)
}

pub async fn list_for_employee(
    conn: &mut SqliteConnection,
    employee_id: i64,
) -> Result<Vec<Schedule>> {
    let schedules = sqlx::query_as::<_, Schedule>(&format!(
        "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE employee_id = ? ORDER BY scheduled_date, id"
    ))
    .bind(employee_id)
    .fetch_all(conn)
    .await?;

    Ok(schedules)
}

pub async fn list_for_employee_date(
    conn: &mut SqliteConnection,
    employee_id: i64,
    date: NaiveDate,
) -> Result<Vec<Schedule>> {
    list_for_range(conn, Some(employee_id), date, date).await
}
