//! Two overtime rules live side by side:
//!
//! * the schedule rule ([`overtime_for_day`], [`overtime_per_day`]) is signed,
//!   so working less than planned, or not at all, shows up as a deficit;
//! * the totals rule ([`monthly_overtime_from_totals`]) never goes below zero
//!   and is what the reconciler stores, per day and per month.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::schedule_hours::hours_between;
use crate::model::{Schedule, YearMonth};

/// Worked minus scheduled, or 0 when either side is not positive.
pub fn overtime_for_day(scheduled_hours: f64, work_hours: f64) -> f64 {
    if scheduled_hours <= 0.0 || work_hours <= 0.0 {
        return 0.0;
    }
    work_hours - scheduled_hours
}

/// Signed overtime per scheduled date. A date with no recorded work owes its
/// full scheduled hours. Entries sharing a date are planned as one day.
pub fn overtime_per_day(
    schedules: &[Schedule],
    work_hours_by_date: &BTreeMap<NaiveDate, f64>,
) -> BTreeMap<NaiveDate, f64> {
    let mut scheduled_by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for s in schedules {
        *scheduled_by_date.entry(s.scheduled_date).or_default() +=
            hours_between(s.start_time, s.end_time);
    }

    scheduled_by_date
        .into_iter()
        .map(|(date, scheduled)| {
            let overtime = match work_hours_by_date.get(&date) {
                Some(&worked) => overtime_for_day(scheduled, worked),
                None => 0.0 - scheduled,
            };
            (date, overtime)
        })
        .collect()
}

pub fn monthly_overtime_from_per_day(
    schedules: &[Schedule],
    work_hours_by_date: &BTreeMap<NaiveDate, f64>,
    report_month: YearMonth,
) -> f64 {
    overtime_per_day(schedules, work_hours_by_date)
        .into_iter()
        .filter(|(date, _)| report_month.contains(*date))
        .map(|(_, overtime)| overtime)
        .sum()
}

/// Excess of worked over scheduled hours, floored at 0.
pub fn monthly_overtime_from_totals(monthly_work_hours: f64, monthly_scheduled_hours: f64) -> f64 {
    if monthly_work_hours > monthly_scheduled_hours {
        monthly_work_hours - monthly_scheduled_hours
    } else {
        0.0
    }
}
