//! Pure hour arithmetic behind the reports. Nothing here touches the store.

pub mod checkpoint_hours;
pub mod overtime;
pub mod schedule_hours;
