pub mod checkpoint;
pub mod reconcile;
pub mod report;
pub mod schedule;
pub mod worklog;
