use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Reconciled figures for one employee on one worked day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyFigure {
    pub employee_id: i64,
    pub date: NaiveDate,
    pub report_month: NaiveDate,
    pub work_hours: f64,
    pub overtime_hours: f64,
    /// 1 when any time was worked that day, else 0.
    pub work_day: i64,
}

/// Reconciled aggregate for one employee across one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MonthlySummary {
    pub employee_id: i64,
    pub report_month: NaiveDate,
    pub monthly_work_hours: f64,
    pub monthly_overtime_hours: f64,
    pub monthly_work_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeMonthReport {
    pub employee_id: i64,
    pub full_name: String,
    pub report_month: NaiveDate,
    pub daily: Vec<DailyFigure>,
    pub summary: Option<MonthlySummary>,
}

/// Signed overtime against the schedule: missed shifts count negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleBalance {
    pub employee_id: i64,
    pub report_month: NaiveDate,
    pub per_day: BTreeMap<NaiveDate, f64>,
    pub monthly_total: f64,
}
