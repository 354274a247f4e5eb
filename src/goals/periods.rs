//! Period generation for checkpoint schedules.
//!
//! Pure date arithmetic: no I/O, so the whole thing is unit-testable with
//! fixed dates.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::goals::types::Frequency;
use crate::shared::error::OkrError;

/// One checkpoint slot: a labeled date bucket with its cumulative target.
#[derive(Debug, Clone, PartialEq)]
pub struct Period {
    pub label: String,
    pub target_value: f64,
    pub due_date: NaiveDate,
}

/// Walks from `start` to `end` in `frequency`-sized steps and distributes
/// the span between `initial_value` and `target_value` linearly over the
/// resulting buckets. Cumulative targets are non-decreasing and the final
/// one is `target_value` itself, assigned directly so no floating-point
/// drift can accumulate.
pub fn generate_periods(
    start: NaiveDate,
    end: NaiveDate,
    frequency: Frequency,
    initial_value: f64,
    target_value: f64,
) -> Result<Vec<Period>, OkrError> {
    if end < start {
        return Err(OkrError::InvalidRange(format!(
            "end date {end} precedes start date {start}"
        )));
    }

    let mut starts = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        starts.push(cursor);
        cursor = advance(cursor, frequency);
    }
    // start <= end guarantees at least one bucket
    let count = starts.len();
    let span = target_value - initial_value;

    let periods = starts
        .iter()
        .enumerate()
        .map(|(i, &period_start)| {
            let target_value = if i + 1 == count {
                target_value
            } else {
                initial_value + span * (i as f64 + 1.0) / count as f64
            };
            let due_date = if i + 1 == count {
                end
            } else {
                (starts[i + 1] - Days::new(1)).min(end)
            };
            Period {
                label: period_label(period_start, frequency),
                target_value,
                due_date,
            }
        })
        .collect();

    Ok(periods)
}

fn advance(date: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::Weekly => date + Days::new(7),
        Frequency::Biweekly => date + Days::new(14),
        Frequency::Monthly => date + Months::new(1),
        Frequency::Quarterly => date + Months::new(3),
    }
}

fn period_label(date: NaiveDate, frequency: Frequency) -> String {
    match frequency {
        Frequency::Monthly => format!("{:04}-{:02}", date.year(), date.month()),
        Frequency::Quarterly => format!("{:04}-Q{}", date.year(), (date.month() - 1) / 3 + 1),
        Frequency::Weekly | Frequency::Biweekly => {
            let week = date.iso_week();
            format!("{:04}-W{:02}", week.year(), week.week())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monthly_quarter_splits_into_three_cumulative_targets() {
        let periods = generate_periods(
            date(2024, 1, 1),
            date(2024, 3, 31),
            Frequency::Monthly,
            0.0,
            300.0,
        )
        .unwrap();

        assert_eq!(periods.len(), 3);
        let labels: Vec<&str> = periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-01", "2024-02", "2024-03"]);
        let targets: Vec<f64> = periods.iter().map(|p| p.target_value).collect();
        assert_eq!(targets, vec![100.0, 200.0, 300.0]);
        assert_eq!(periods[0].due_date, date(2024, 1, 31));
        assert_eq!(periods[2].due_date, date(2024, 3, 31));
    }

    #[test]
    fn single_day_range_yields_one_full_target_period() {
        let periods = generate_periods(
            date(2024, 1, 1),
            date(2024, 1, 1),
            Frequency::Weekly,
            0.0,
            50.0,
        )
        .unwrap();

        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].target_value, 50.0);
        assert_eq!(periods[0].due_date, date(2024, 1, 1));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let err = generate_periods(
            date(2024, 6, 1),
            date(2024, 1, 1),
            Frequency::Monthly,
            0.0,
            100.0,
        )
        .unwrap_err();
        assert!(matches!(err, OkrError::InvalidRange(_)));
    }

    #[test]
    fn targets_are_non_decreasing_and_end_exactly_on_target() {
        let cases = [
            (Frequency::Weekly, date(2024, 1, 1), date(2024, 4, 30)),
            (Frequency::Biweekly, date(2024, 1, 1), date(2024, 12, 31)),
            (Frequency::Monthly, date(2023, 11, 15), date(2024, 7, 1)),
            (Frequency::Quarterly, date(2024, 1, 1), date(2025, 12, 31)),
        ];
        for (frequency, start, end) in cases {
            let periods = generate_periods(start, end, frequency, 0.0, 7.0).unwrap();
            assert!(!periods.is_empty());
            for pair in periods.windows(2) {
                assert!(pair[0].target_value <= pair[1].target_value);
                assert!(pair[0].due_date < pair[1].due_date);
            }
            assert_eq!(periods.last().unwrap().target_value, 7.0);
        }
    }

    #[test]
    fn initial_value_offsets_the_whole_ramp() {
        let periods = generate_periods(
            date(2024, 1, 1),
            date(2024, 3, 31),
            Frequency::Monthly,
            100.0,
            400.0,
        )
        .unwrap();

        let targets: Vec<f64> = periods.iter().map(|p| p.target_value).collect();
        assert_eq!(targets, vec![200.0, 300.0, 400.0]);
    }

    #[test]
    fn quarterly_labels_follow_the_calendar_quarter() {
        let periods = generate_periods(
            date(2024, 2, 1),
            date(2024, 11, 30),
            Frequency::Quarterly,
            0.0,
            100.0,
        )
        .unwrap();

        let labels: Vec<&str> = periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-Q1", "2024-Q2", "2024-Q3", "2024-Q4"]);
    }

    #[test]
    fn weekly_labels_use_iso_weeks() {
        // 2024-01-01 is a Monday, so it opens ISO week 1 of 2024.
        let periods = generate_periods(
            date(2024, 1, 1),
            date(2024, 1, 21),
            Frequency::Weekly,
            0.0,
            30.0,
        )
        .unwrap();

        let labels: Vec<&str> = periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-W01", "2024-W02", "2024-W03"]);
        // Intermediate due dates close the day before the next week opens.
        assert_eq!(periods[0].due_date, date(2024, 1, 7));
    }

    #[test]
    fn biweekly_steps_fourteen_days() {
        let periods = generate_periods(
            date(2024, 1, 1),
            date(2024, 2, 1),
            Frequency::Biweekly,
            0.0,
            90.0,
        )
        .unwrap();

        // Cursors land on Jan 1, Jan 15 and Jan 29.
        assert_eq!(periods.len(), 3);
        assert_eq!(periods[1].due_date, date(2024, 1, 28));
        assert_eq!(periods[2].due_date, date(2024, 2, 1));
    }
}
