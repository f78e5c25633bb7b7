use chrono::{Duration, NaiveDate};

use crate::error::EngineError;
use crate::models::ExpectedCheckpoint;
use crate::site_time::site_datetime;

pub const DEFAULT_GRACE_SECONDS: i64 = 600;

const NIGHT_STEP_MINUTES: i64 = 30;
const DAY_STEP_MINUTES: i64 = 60;

/// Expected patrol rounds for one report date.
///
/// The 24-hour cycle is covered by two regimes: the night shift runs from
/// 21:00 of the previous day through 05:30 of the report date every 30
/// minutes, the day shift from 06:00 through 21:00 of the report date
/// every hour. Both regimes include their endpoints.
pub fn expected_checkpoints(
    date: NaiveDate,
    grace: Duration,
) -> Result<Vec<ExpectedCheckpoint>, EngineError> {
    let previous = date
        .pred_opt()
        .ok_or_else(|| EngineError::InvalidDate(date.to_string()))?;

    let mut times = Vec::new();

    let night_end = site_datetime(date, 5, 30);
    let mut cursor = site_datetime(previous, 21, 0);
    while cursor <= night_end {
        times.push(cursor);
        cursor += Duration::minutes(NIGHT_STEP_MINUTES);
    }

    let day_end = site_datetime(date, 21, 0);
    let mut cursor = site_datetime(date, 6, 0);
    while cursor <= day_end {
        times.push(cursor);
        cursor += Duration::minutes(DAY_STEP_MINUTES);
    }

    // The regimes never overlap, but the hand-off stays sorted and unique
    // even if the step tables change.
    times.sort();
    times.dedup();

    Ok(times
        .into_iter()
        .enumerate()
        .map(|(index, scheduled_time)| ExpectedCheckpoint {
            round_number: index as u32 + 1,
            scheduled_time,
            window_start: scheduled_time - grace,
            window_end: scheduled_time + grace,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 22).unwrap()
    }

    fn rounds() -> Vec<ExpectedCheckpoint> {
        expected_checkpoints(report_date(), Duration::seconds(DEFAULT_GRACE_SECONDS)).unwrap()
    }

    #[test]
    fn produces_34_rounds_per_day() {
        let rounds = rounds();
        assert_eq!(rounds.len(), 34);

        let day_start = site_datetime(report_date(), 6, 0);
        let night = rounds.iter().filter(|r| r.scheduled_time < day_start).count();
        assert_eq!(night, 18);
        assert_eq!(rounds.len() - night, 16);
    }

    #[test]
    fn rounds_are_strictly_ascending_and_unique() {
        let rounds = rounds();
        for pair in rounds.windows(2) {
            assert!(pair[0].scheduled_time < pair[1].scheduled_time);
        }
    }

    #[test]
    fn boundaries_appear_exactly_once() {
        let rounds = rounds();
        let previous = report_date().pred_opt().unwrap();
        for boundary in [
            site_datetime(previous, 21, 0),
            site_datetime(report_date(), 5, 30),
            site_datetime(report_date(), 6, 0),
            site_datetime(report_date(), 21, 0),
        ] {
            let hits = rounds.iter().filter(|r| r.scheduled_time == boundary).count();
            assert_eq!(hits, 1, "boundary {boundary} appeared {hits} times");
        }
    }

    #[test]
    fn round_numbers_run_from_one() {
        let rounds = rounds();
        let numbers: Vec<u32> = rounds.iter().map(|r| r.round_number).collect();
        let expected: Vec<u32> = (1..=34).collect();
        assert_eq!(numbers, expected);
    }

    #[test]
    fn windows_bracket_the_scheduled_time() {
        for round in rounds() {
            assert!(round.window_start <= round.scheduled_time);
            assert!(round.scheduled_time <= round.window_end);
            assert_eq!(round.window_end - round.window_start, Duration::seconds(1200));
        }
    }
}
