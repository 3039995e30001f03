use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::month::YearMonth;
use super::schedule::ScheduleType;

/// Which slice of the worklog projection to rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorklogScope {
    Month(YearMonth),
    Employee { employee_id: i64, month: YearMonth },
    Date(NaiveDate),
}

impl WorklogScope {
    /// The report month whose figures feed the projection.
    pub fn month(&self) -> YearMonth {
        match self {
            WorklogScope::Month(month) => *month,
            WorklogScope::Employee { month, .. } => *month,
            WorklogScope::Date(date) => YearMonth::of(*date),
        }
    }

    /// Inclusive scheduled-date range covered by the scope.
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        match self {
            WorklogScope::Date(date) => (*date, *date),
            _ => {
                let month = self.month();
                (month.first_day(), month.last_day())
            }
        }
    }

    pub fn employee_id(&self) -> Option<i64> {
        match self {
            WorklogScope::Employee { employee_id, .. } => Some(*employee_id),
            _ => None,
        }
    }
}

/// Denormalized, disposable read row: one schedule entry plus report figures.
/// Hours are whole numbers, truncated toward zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorklogRow {
    pub employee_id: i64,
    pub full_name: String,
    pub scheduled_date: NaiveDate,
    pub schedule_type: ScheduleType,
    pub work_hours: i64,
    pub overtime_hours: i64,
    pub scheduled_hours: i64,
    pub scheduled_work_days: i64,
    pub monthly_work_days: i64,
    pub monthly_overtime_hours: i64,
}
