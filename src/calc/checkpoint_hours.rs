use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::model::{Checkpoint, YearMonth};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Hours of one completed session; open or inverted sessions give 0.
pub fn work_hours_for_checkpoint(cp: &Checkpoint) -> f64 {
    match (cp.check_in_time, cp.check_out_time) {
        (Some(check_in), Some(check_out)) => {
            let hours = (check_out - check_in).num_seconds() as f64 / SECONDS_PER_HOUR;
            hours.max(0.0)
        }
        _ => 0.0,
    }
}

/// Completed sessions whose check-in falls inside `month`.
fn completed_in<'a>(
    checkpoints: &'a [Checkpoint],
    month: YearMonth,
) -> impl Iterator<Item = (NaiveDate, &'a Checkpoint)> + 'a {
    checkpoints
        .iter()
        .filter(|cp| cp.is_complete())
        .filter_map(move |cp| {
            let date = cp.check_in_time?.date();
            month.contains(date).then_some((date, cp))
        })
}

pub fn monthly_work_hours(checkpoints: &[Checkpoint], month: YearMonth) -> f64 {
    completed_in(checkpoints, month)
        .map(|(_, cp)| work_hours_for_checkpoint(cp))
        .sum()
}

/// Distinct check-in dates; several sessions on one day count once.
pub fn monthly_work_days(checkpoints: &[Checkpoint], month: YearMonth) -> i64 {
    completed_in(checkpoints, month)
        .map(|(date, _)| date)
        .collect::<BTreeSet<_>>()
        .len() as i64
}

/// Completed sessions of `month` grouped by check-in date.
pub fn group_by_check_in_date(
    checkpoints: &[Checkpoint],
    month: YearMonth,
) -> BTreeMap<NaiveDate, Vec<&Checkpoint>> {
    let mut days: BTreeMap<NaiveDate, Vec<&Checkpoint>> = BTreeMap::new();
    for (date, cp) in completed_in(checkpoints, month) {
        days.entry(date).or_default().push(cp);
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SessionStatus;
    use chrono::NaiveDateTime;

    fn ts(d: (i32, u32, u32), h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(d.0, d.1, d.2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn session(check_in: Option<NaiveDateTime>, check_out: Option<NaiveDateTime>) -> Checkpoint {
        Checkpoint {
            id: 0,
            employee_id: 1,
            check_in_time: check_in,
            check_out_time: check_out,
            session_status: SessionStatus::from_times(check_in, check_out),
        }
    }

    fn march() -> YearMonth {
        YearMonth::new(2025, 3).unwrap()
    }

    #[test]
    fn completed_session_hours() {
        let cp = session(Some(ts((2025, 3, 3), 9, 0)), Some(ts((2025, 3, 3), 17, 30)));
        assert_eq!(work_hours_for_checkpoint(&cp), 8.5);
    }

    #[test]
    fn session_across_midnight_counts_full_length() {
        let cp = session(Some(ts((2025, 3, 3), 22, 0)), Some(ts((2025, 3, 4), 6, 0)));
        assert_eq!(work_hours_for_checkpoint(&cp), 8.0);
    }

    #[test]
    fn open_or_inverted_sessions_are_zero() {
        assert_eq!(work_hours_for_checkpoint(&session(Some(ts((2025, 3, 3), 9, 0)), None)), 0.0);
        assert_eq!(work_hours_for_checkpoint(&session(None, None)), 0.0);
        let inverted = session(Some(ts((2025, 3, 3), 17, 0)), Some(ts((2025, 3, 3), 9, 0)));
        assert_eq!(work_hours_for_checkpoint(&inverted), 0.0);
    }

    #[test]
    fn monthly_hours_use_check_in_month() {
        let cps = vec![
            session(Some(ts((2025, 3, 3), 9, 0)), Some(ts((2025, 3, 3), 17, 0))),
            session(Some(ts((2025, 3, 31), 22, 0)), Some(ts((2025, 4, 1), 2, 0))),
            session(Some(ts((2025, 4, 1), 9, 0)), Some(ts((2025, 4, 1), 17, 0))),
            session(Some(ts((2025, 3, 5), 9, 0)), None),
        ];
        assert_eq!(monthly_work_hours(&cps, march()), 12.0);
    }

    #[test]
    fn work_days_count_distinct_dates() {
        let cps = vec![
            session(Some(ts((2025, 3, 3), 8, 0)), Some(ts((2025, 3, 3), 12, 0))),
            session(Some(ts((2025, 3, 3), 13, 0)), Some(ts((2025, 3, 3), 17, 0))),
            session(Some(ts((2025, 3, 4), 9, 0)), Some(ts((2025, 3, 4), 10, 0))),
            session(Some(ts((2025, 3, 5), 9, 0)), None),
        ];
        assert_eq!(monthly_work_days(&cps, march()), 2);
    }

    #[test]
    fn groups_sessions_per_day() {
        let cps = vec![
            session(Some(ts((2025, 3, 3), 8, 0)), Some(ts((2025, 3, 3), 12, 0))),
            session(Some(ts((2025, 3, 3), 13, 0)), Some(ts((2025, 3, 3), 17, 0))),
            session(Some(ts((2025, 3, 4), 9, 0)), Some(ts((2025, 3, 4), 10, 0))),
        ];
        let days = group_by_check_in_date(&cps, march());
        assert_eq!(days.len(), 2);
        assert_eq!(days[&NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()].len(), 2);
    }
}
