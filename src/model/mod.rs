pub mod checkpoint;
pub mod employee;
pub mod month;
pub mod report;
pub mod role;
pub mod schedule;
pub mod worklog;

pub use checkpoint::{Checkpoint, CheckpointPatch, NewCheckpoint, SessionStatus};
pub use employee::{Employee, NewEmployee};
pub use month::YearMonth;
pub use report::{DailyFigure, EmployeeMonthReport, MonthlySummary, ScheduleBalance};
pub use role::Role;
pub use schedule::{NewSchedule, Schedule, ScheduleChange, ScheduleType};
pub use worklog::{WorklogRow, WorklogScope};
