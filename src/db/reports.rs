use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::error::Result;
use crate::model::{DailyFigure, MonthlySummary, YearMonth};

/// Create-or-update by (employee_id, date).
pub async fn upsert_daily_figure(conn: &mut SqliteConnection, figure: &DailyFigure) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO daily_figures
        (employee_id, date, report_month, work_hours, overtime_hours, work_day)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(employee_id, date) DO UPDATE SET
            report_month = excluded.report_month,
            work_hours = excluded.work_hours,
            overtime_hours = excluded.overtime_hours,
            work_day = excluded.work_day
        "#,
    )
    .bind(figure.employee_id)
    .bind(figure.date)
    .bind(figure.report_month)
    .bind(figure.work_hours)
    .bind(figure.overtime_hours)
    .bind(figure.work_day)
    .execute(conn)
    .await?;

    Ok(())
}

/// Create-or-update by (employee_id, report_month).
pub async fn upsert_monthly_summary(
    conn: &mut SqliteConnection,
    summary: &MonthlySummary,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO monthly_summaries
        (employee_id, report_month, monthly_work_hours, monthly_overtime_hours, monthly_work_days)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(employee_id, report_month) DO UPDATE SET
            monthly_work_hours = excluded.monthly_work_hours,
            monthly_overtime_hours = excluded.monthly_overtime_hours,
            monthly_work_days = excluded.monthly_work_days
        "#,
    )
    .bind(summary.employee_id)
    .bind(summary.report_month)
    .bind(summary.monthly_work_hours)
    .bind(summary.monthly_overtime_hours)
    .bind(summary.monthly_work_days)
    .execute(conn)
    .await?;

    Ok(())
}

/// Drops the month's daily rows whose date is not in `keep`.
pub async fn delete_daily_figures_except(
    conn: &mut SqliteConnection,
    employee_id: i64,
    month: YearMonth,
    keep: &[NaiveDate],
) -> Result<u64> {
    let mut query: QueryBuilder<Sqlite> =
        QueryBuilder::new("DELETE FROM daily_figures WHERE employee_id = ");
    query.push_bind(employee_id);
    query.push(" AND report_month = ");
    query.push_bind(month.first_day());

    if !keep.is_empty() {
        query.push(" AND date NOT IN (");
        let mut dates = query.separated(", ");
        for date in keep {
            dates.push_bind(*date);
        }
        dates.push_unseparated(")");
    }

    let result = query.build().execute(conn).await?;
    Ok(result.rows_affected())
}

pub async fn daily_figures_for_month(
    conn: &mut SqliteConnection,
    employee_id: Option<i64>,
    month: YearMonth,
) -> Result<Vec<DailyFigure>> {
    let figures = sqlx::query_as::<_, DailyFigure>(
        r#"
        SELECT employee_id, date, report_month, work_hours, overtime_hours, work_day
        FROM daily_figures
        WHERE report_month = ? AND (? IS NULL OR employee_id = ?)
        ORDER BY employee_id, date
        "#,
    )
    .bind(month.first_day())
    .bind(employee_id)
    .bind(employee_id)
    .fetch_all(conn)
    .await?;

    Ok(figures)
}

pub async fn summaries_for_month(
    conn: &mut SqliteConnection,
    employee_id: Option<i64>,
    month: YearMonth,
) -> Result<Vec<MonthlySummary>> {
    let summaries = sqlx::query_as::<_, MonthlySummary>(
        r#"
        SELECT employee_id, report_month, monthly_work_hours,
               monthly_overtime_hours, monthly_work_days
        FROM monthly_summaries
        WHERE report_month = ? AND (? IS NULL OR employee_id = ?)
        ORDER BY employee_id
        "#,
    )
    .bind(month.first_day())
    .bind(employee_id)
    .bind(employee_id)
    .fetch_all(conn)
    .await?;

    Ok(summaries)
}
