use chrono::Duration;

use crate::models::{ComplianceStatus, ExpectedCheckpoint, MatchResult, ScanEvent};

fn distance_seconds(scan: &ScanEvent, expected: &ExpectedCheckpoint) -> i64 {
    (scan.scan_time - expected.scheduled_time).num_seconds().abs()
}

/// Windowed policy: each expected round is paired with the earliest scan
/// inside its tolerance window, or with nothing.
pub fn match_windowed(expected: &[ExpectedCheckpoint], scans: &[ScanEvent]) -> Vec<MatchResult> {
    let mut ordered: Vec<&ScanEvent> = scans.iter().collect();
    ordered.sort_by_key(|scan| scan.scan_time);

    expected
        .iter()
        .map(|round| {
            let hit = ordered
                .iter()
                .find(|scan| scan.scan_time >= round.window_start && scan.scan_time <= round.window_end);
            match hit {
                Some(scan) => MatchResult {
                    expected: round.clone(),
                    distance_seconds: distance_seconds(scan, round) as f64,
                    scan: Some((*scan).clone()),
                },
                None => MatchResult {
                    expected: round.clone(),
                    scan: None,
                    distance_seconds: f64::INFINITY,
                },
            }
        })
        .collect()
}

/// Nearest-neighbor policy: assigns one scan to the expected round with
/// the minimum absolute time difference. Ties go to the earlier round.
pub fn nearest_expected<'a>(
    expected: &'a [ExpectedCheckpoint],
    scan: &ScanEvent,
) -> Option<(&'a ExpectedCheckpoint, i64)> {
    let mut best: Option<(&ExpectedCheckpoint, i64)> = None;
    for round in expected {
        let diff = distance_seconds(scan, round);
        match best {
            Some((_, best_diff)) if diff >= best_diff => {}
            _ => best = Some((round, diff)),
        }
    }
    best
}

pub fn classify_windowed(result: &MatchResult) -> ComplianceStatus {
    if result.scan.is_some() {
        ComplianceStatus::Success
    } else {
        ComplianceStatus::Missed
    }
}

/// Tri-state classification of a scan from its nearest-round distance.
/// `None` means the date had no expected rounds at all.
pub fn classify_nearest(nearest: Option<i64>, grace: Duration) -> ComplianceStatus {
    match nearest {
        None => ComplianceStatus::Missed,
        Some(diff) if diff <= grace.num_seconds() => ComplianceStatus::Success,
        Some(_) => ComplianceStatus::Late,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, NaiveDate};
    use uuid::Uuid;

    use crate::site_time::site_datetime;

    fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
        let date = NaiveDate::from_ymd_opt(2026, 1, 22).unwrap();
        site_datetime(date, hour, minute)
    }

    fn scan_at(time: DateTime<FixedOffset>) -> ScanEvent {
        ScanEvent {
            id: Uuid::new_v4(),
            guard_name: "Ravi Kumar".to_string(),
            checkpoint_id: Uuid::new_v4(),
            checkpoint_label: "Main Gate".to_string(),
            scan_time: time,
            latitude: Some(11.0168),
            longitude: Some(76.9558),
            factory_code: "F1".to_string(),
            round_slot: None,
            status: None,
        }
    }

    fn round_at(time: DateTime<FixedOffset>, number: u32, grace_secs: i64) -> ExpectedCheckpoint {
        let grace = Duration::seconds(grace_secs);
        ExpectedCheckpoint {
            round_number: number,
            scheduled_time: time,
            window_start: time - grace,
            window_end: time + grace,
        }
    }

    #[test]
    fn windowed_accepts_scan_nine_minutes_late() {
        let rounds = vec![round_at(at(6, 0), 1, 600)];
        let scans = vec![scan_at(at(6, 9))];
        let results = match_windowed(&rounds, &scans);
        assert!(results[0].scan.is_some());
        assert_eq!(results[0].distance_seconds, 540.0);
    }

    #[test]
    fn windowed_rejects_scan_eleven_minutes_late() {
        let rounds = vec![round_at(at(6, 0), 1, 600)];
        let scans = vec![scan_at(at(6, 11))];
        let results = match_windowed(&rounds, &scans);
        assert!(results[0].scan.is_none());
        assert!(results[0].distance_seconds.is_infinite());
    }

    #[test]
    fn windowed_picks_earliest_scan_in_window() {
        let rounds = vec![round_at(at(6, 0), 1, 600)];
        let late = scan_at(at(6, 8));
        let early = scan_at(at(5, 55));
        let results = match_windowed(&rounds, &[late, early.clone()]);
        assert_eq!(results[0].scan.as_ref().map(|s| s.id), Some(early.id));
    }

    #[test]
    fn nearest_assigns_scan_to_closest_round() {
        let rounds = vec![round_at(at(6, 0), 1, 600), round_at(at(7, 0), 2, 600)];
        let scan = scan_at(at(6, 40));
        let (best, diff) = nearest_expected(&rounds, &scan).unwrap();
        assert_eq!(best.scheduled_time, at(7, 0));
        assert_eq!(diff, 20 * 60);
    }

    #[test]
    fn nearest_breaks_ties_toward_earlier_round() {
        let rounds = vec![round_at(at(6, 0), 1, 600), round_at(at(7, 0), 2, 600)];
        let scan = scan_at(at(6, 30));
        let (best, _) = nearest_expected(&rounds, &scan).unwrap();
        assert_eq!(best.scheduled_time, at(6, 0));
    }

    #[test]
    fn nearest_is_none_without_rounds() {
        let scan = scan_at(at(6, 30));
        assert!(nearest_expected(&[], &scan).is_none());
    }

    #[test]
    fn classify_windowed_is_boolean() {
        let rounds = vec![round_at(at(6, 0), 1, 600)];
        let matched = &match_windowed(&rounds, &[scan_at(at(6, 5))])[0];
        let unmatched = &match_windowed(&rounds, &[])[0];
        assert_eq!(classify_windowed(matched), ComplianceStatus::Success);
        assert_eq!(classify_windowed(unmatched), ComplianceStatus::Missed);
    }

    #[test]
    fn classify_nearest_is_tristate() {
        let grace = Duration::seconds(600);
        assert_eq!(classify_nearest(None, grace), ComplianceStatus::Missed);
        assert_eq!(classify_nearest(Some(600), grace), ComplianceStatus::Success);
        assert_eq!(classify_nearest(Some(601), grace), ComplianceStatus::Late);
    }
}
