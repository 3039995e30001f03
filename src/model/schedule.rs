use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ScheduleType {
    Shift,
    Overtime,
    DayOff,
    PaidTimeOff,
    SickLeave,
}

impl ScheduleType {
    /// Shift and overtime blocks are the ones counted as scheduled work.
    pub fn is_work(&self) -> bool {
        matches!(self, ScheduleType::Shift | ScheduleType::Overtime)
    }
}

/// One planned work block for one employee and calendar date.
///
/// `start_time`/`end_time` at midnight (`NaiveTime::MIN`) mean "not set".
/// `scheduled_monthly_hours` is not stored; read paths fill it in for every
/// entry of the same employee and month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Schedule {
    pub id: i64,
    pub employee_id: i64,
    pub scheduled_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub schedule_type: ScheduleType,
    pub scheduled_hours: f64,
    #[sqlx(default)]
    pub scheduled_monthly_hours: f64,
    pub scheduled_work_days: i64,
}

impl Schedule {
    pub fn has_times(&self) -> bool {
        self.start_time != NaiveTime::MIN && self.end_time != NaiveTime::MIN
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSchedule {
    pub scheduled_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub schedule_type: ScheduleType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleChange {
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub schedule_type: ScheduleType,
}
