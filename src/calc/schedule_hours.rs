use chrono::{Duration, NaiveTime};

use crate::model::{Schedule, YearMonth};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Length of a shift in hours. An end before the start crosses midnight.
pub fn hours_between(start: NaiveTime, end: NaiveTime) -> f64 {
    let mut diff = end - start;
    if diff < Duration::zero() {
        diff = diff + Duration::hours(24);
    }
    diff.num_seconds() as f64 / SECONDS_PER_HOUR
}

/// Number of shift/overtime entries that have both times set.
pub fn count_scheduled_shifts_and_overtimes(entries: &[Schedule]) -> i64 {
    entries
        .iter()
        .filter(|s| s.schedule_type.is_work() && s.has_times())
        .count() as i64
}

/// Planned hours of the entries dated inside `month` with both times set.
pub fn monthly_scheduled_hours<'a, I>(entries: I, month: YearMonth) -> f64
where
    I: IntoIterator<Item = &'a Schedule>,
{
    entries
        .into_iter()
        .filter(|s| month.contains(s.scheduled_date) && s.has_times())
        .map(|s| hours_between(s.start_time, s.end_time))
        .sum()
}
