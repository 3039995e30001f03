use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::error::Result;
use crate::model::WorklogRow;

/// Bound-parameter cap of SQLite builds before 3.32; later builds allow more.
const SQLITE_MAX_VARIABLES: usize = 999;
const WORKLOG_COLUMNS: usize = 9;
const ROWS_PER_INSERT: usize = SQLITE_MAX_VARIABLES / WORKLOG_COLUMNS;

/// Removes every projected row dated within `[from, to]`, optionally only
/// for one employee.
pub async fn delete_range(
    conn: &mut SqliteConnection,
    employee_id: Option<i64>,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM worklogs
        WHERE scheduled_date >= ? AND scheduled_date <= ?
          AND (? IS NULL OR employee_id = ?)
        "#,
    )
    .bind(from)
    .bind(to)
    .bind(employee_id)
    .bind(employee_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

pub async fn insert_many(conn: &mut SqliteConnection, rows: &[WorklogRow]) -> Result<u64> {
    let mut inserted = 0;

    for chunk in rows.chunks(ROWS_PER_INSERT) {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO worklogs (employee_id, scheduled_date, schedule_type, work_hours, \
             overtime_hours, scheduled_hours, scheduled_work_days, monthly_work_days, \
             monthly_overtime_hours) ",
        );
        query.push_values(chunk, |mut b, row| {
            b.push_bind(row.employee_id)
                .push_bind(row.scheduled_date)
                .push_bind(row.schedule_type)
                .push_bind(row.work_hours)
                .push_bind(row.overtime_hours)
                .push_bind(row.scheduled_hours)
                .push_bind(row.scheduled_work_days)
                .push_bind(row.monthly_work_days)
                .push_bind(row.monthly_overtime_hours);
        });

        inserted += query.build().execute(&mut *conn).await?.rows_affected();
    }

    Ok(inserted)
}

/// Stored rows for the range, with the employee's display name.
pub async fn list_range(
    conn: &mut SqliteConnection,
    employee_id: Option<i64>,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<WorklogRow>> {
    let rows = sqlx::query_as::<_, WorklogRow>(
        r#"
        SELECT w.employee_id, e.full_name, w.scheduled_date, w.schedule_type,
               w.work_hours, w.overtime_hours, w.scheduled_hours,
               w.scheduled_work_days, w.monthly_work_days, w.monthly_overtime_hours
        FROM worklogs w
        JOIN employees e ON e.id = w.employee_id
        WHERE w.scheduled_date >= ? AND w.scheduled_date <= ?
          AND (? IS NULL OR w.employee_id = ?)
        ORDER BY w.scheduled_date, w.employee_id, w.id
        "#,
    )
    .bind(from)
    .bind(to)
    .bind(employee_id)
    .bind(employee_id)
    .fetch_all(conn)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{date, employee, memory_pool};
    use crate::model::ScheduleType;

    #[tokio::test]
    async fn inserts_beyond_one_statement_in_chunks() {
        let pool = memory_pool().await;
        let e = employee(&pool, "sven").await;
        let rows: Vec<WorklogRow> = (0..ROWS_PER_INSERT * 2 + 5)
            .map(|i| WorklogRow {
                employee_id: e.id,
                full_name: e.full_name.clone(),
                scheduled_date: date(2025, 3, 1 + (i % 28) as u32),
                schedule_type: ScheduleType::Shift,
                work_hours: 8,
                overtime_hours: 0,
                scheduled_hours: 8,
                scheduled_work_days: 1,
                monthly_work_days: 20,
                monthly_overtime_hours: 0,
            })
            .collect();

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(insert_many(&mut conn, &rows).await.unwrap(), rows.len() as u64);

        let stored = list_range(&mut conn, Some(e.id), date(2025, 3, 1), date(2025, 3, 31))
            .await
            .unwrap();
        assert_eq!(stored.len(), rows.len());
        assert!(ROWS_PER_INSERT * WORKLOG_COLUMNS <= SQLITE_MAX_VARIABLES);
    }
}
