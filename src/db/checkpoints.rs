use chrono::NaiveDateTime;
use sqlx::SqliteConnection;

use crate::error::Result;
use crate::model::{Checkpoint, SessionStatus, YearMonth};

const CHECKPOINT_COLUMNS: &str =
    "id, employee_id, check_in_time, check_out_time, session_status";

pub async fn insert_checkpoint(
    conn: &mut SqliteConnection,
    employee_id: i64,
    check_in_time: Option<NaiveDateTime>,
    check_out_time: Option<NaiveDateTime>,
) -> Result<Checkpoint> {
    let session_status = SessionStatus::from_times(check_in_time, check_out_time);

    let id = sqlx::query(
        r#"
        INSERT INTO checkpoints (employee_id, check_in_time, check_out_time, session_status)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(check_in_time)
    .bind(check_out_time)
    .bind(session_status)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(Checkpoint {
        id,
        employee_id,
        check_in_time,
        check_out_time,
        session_status,
    })
}

pub async fn find_checkpoint(
    conn: &mut SqliteConnection,
    employee_id: i64,
    checkpoint_id: i64,
) -> Result<Option<Checkpoint>> {
    let checkpoint = sqlx::query_as::<_, Checkpoint>(&format!(
        "SELECT {CHECKPOINT_COLUMNS} FROM checkpoints WHERE id = ? AND employee_id = ?"
    ))
    .bind(checkpoint_id)
    .bind(employee_id)
    .fetch_optional(conn)
    .await?;

    Ok(checkpoint)
}

/// Most recent session by check-in time.
pub async fn latest_for_employee(
    conn: &mut SqliteConnection,
    employee_id: i64,
) -> Result<Option<Checkpoint>> {
    let checkpoint = sqlx::query_as::<_, Checkpoint>(&format!(
        r#"
        SELECT {CHECKPOINT_COLUMNS}
        FROM checkpoints
        WHERE employee_id = ?
        ORDER BY check_in_time DESC, id DESC
        LIMIT 1
        "#
    ))
    .bind(employee_id)
    .fetch_optional(conn)
    .await?;

    Ok(checkpoint)
}

/// Writes both times back and re-derives the status from them.
pub async fn save_times(conn: &mut SqliteConnection, checkpoint: &Checkpoint) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE checkpoints
        SET check_in_time = ?, check_out_time = ?, session_status = ?
        WHERE id = ? AND employee_id = ?
        "#,
    )
    .bind(checkpoint.check_in_time)
    .bind(checkpoint.check_out_time)
    .bind(checkpoint.session_status)
    .bind(checkpoint.id)
    .bind(checkpoint.employee_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete_checkpoint(
    conn: &mut SqliteConnection,
    employee_id: i64,
    checkpoint_id: i64,
) -> Result<u64> {
    let result = sqlx::query("DELETE FROM checkpoints WHERE id = ? AND employee_id = ?")
        .bind(checkpoint_id)
        .bind(employee_id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

/// Sessions of any employee checked in during `month`.
pub async fn list_for_month(
    conn: &mut SqliteConnection,
    month: YearMonth,
) -> Result<Vec<Checkpoint>> {
    let (from, until) = month.datetime_range();

    let checkpoints = sqlx::query_as::<_, Checkpoint>(&format!(
        r#"
        SELECT {CHECKPOINT_COLUMNS}
        FROM checkpoints
        WHERE check_in_time >= ? AND check_in_time < ?
        ORDER BY employee_id, check_in_time
        "#
    ))
    .bind(from)
    .bind(until)
    .fetch_all(conn)
    .await?;

    Ok(checkpoints)
}

pub async fn list_for_employee_month(
    conn: &mut SqliteConnection,
    employee_id: i64,
    month: YearMonth,
) -> Result<Vec<Checkpoint>> {
    let (from, until) = month.datetime_range();

    let checkpoints = sqlx::query_as::<_, Checkpoint>(&format!(
        r#"
        SELECT {CHECKPOINT_COLUMNS}
        FROM checkpoints
        WHERE employee_id = ? AND check_in_time >= ? AND check_in_time < ?
        ORDER BY check_in_time
        "#
    ))
    .bind(employee_id)
    .bind(from)
    .bind(until)
    .fetch_all(conn)
    .await?;

    Ok(checkpoints)
}

/// Completed sessions (both times set) checked in during `month`.
pub async fn list_completed_for_employee_month(
    conn: &mut SqliteConnection,
    employee_id: i64,
    month: YearMonth,
) -> Result<Vec<Checkpoint>> {
    let (from, until) = month.datetime_range();

    let checkpoints = sqlx::query_as::<_, Checkpoint>(&format!(
        r#"
        SELECT {CHECKPOINT_COLUMNS}
        FROM checkpoints
        WHERE employee_id = ?
          AND check_in_time IS NOT NULL
          AND check_out_time IS NOT NULL
          AND check_in_time >= ? AND check_in_time < ?
        ORDER BY check_in_time
        "#
    ))
    .bind(employee_id)
    .bind(from)
    .bind(until)
    .fetch_all(conn)
    .await?;

    Ok(checkpoints)
}
