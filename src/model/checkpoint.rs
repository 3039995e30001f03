use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Inactive,
}

impl SessionStatus {
    /// Active only while checked in and not yet checked out.
    pub fn from_times(
        check_in_time: Option<NaiveDateTime>,
        check_out_time: Option<NaiveDateTime>,
    ) -> Self {
        match (check_in_time, check_out_time) {
            (Some(_), None) => SessionStatus::Active,
            _ => SessionStatus::Inactive,
        }
    }
}

/// One clock-in/clock-out session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Checkpoint {
    pub id: i64,
    pub employee_id: i64,
    pub check_in_time: Option<NaiveDateTime>,
    pub check_out_time: Option<NaiveDateTime>,
    pub session_status: SessionStatus,
}

impl Checkpoint {
    /// Both ends of the session are recorded.
    pub fn is_complete(&self) -> bool {
        self.check_in_time.is_some() && self.check_out_time.is_some()
    }
}

/// Manually entered session.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCheckpoint {
    pub employee_id: i64,
    pub check_in_time: Option<NaiveDateTime>,
    pub check_out_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckpointPatch {
    pub check_in_time: Option<NaiveDateTime>,
    pub check_out_time: Option<NaiveDateTime>,
}
