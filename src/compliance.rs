use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::error::EngineError;
use crate::matching;
use crate::models::{
    Checkpoint, ComplianceStatus, ExpectedCheckpoint, GuardComplianceReport, MissedRound,
    RoundReportRow, ScanEvent,
};
use crate::schedule;

/// Per-guard compliance for one report date under the windowed policy.
/// Only scans stamped on the report date count, so the previous evening's
/// night rounds always read as missed here.
pub fn guard_compliance(
    guard_name: &str,
    date: NaiveDate,
    scans: &[ScanEvent],
    grace: Duration,
) -> Result<GuardComplianceReport, EngineError> {
    let expected = schedule::expected_checkpoints(date, grace)?;

    let guard_scans: Vec<ScanEvent> = scans
        .iter()
        .filter(|scan| scan.guard_name == guard_name && scan.scan_time.date_naive() == date)
        .cloned()
        .collect();

    let matches = matching::match_windowed(&expected, &guard_scans);

    let mut on_time_count = 0usize;
    let mut missed_details = Vec::new();
    for result in &matches {
        match matching::classify_windowed(result) {
            ComplianceStatus::Success => on_time_count += 1,
            _ => missed_details.push(MissedRound {
                expected_time: result.expected.scheduled_time.format("%H:%M").to_string(),
                status: ComplianceStatus::Missed,
            }),
        }
    }

    let total_expected = expected.len();
    let missed_count = missed_details.len();

    Ok(GuardComplianceReport {
        guard_name: guard_name.to_string(),
        report_date: date,
        total_expected,
        on_time_count,
        missed_count,
        efficiency_percent: efficiency(on_time_count, total_expected),
        missed_details,
    })
}

/// On-time percentage, rounded to two decimals. 0.0 when nothing was
/// expected.
pub fn efficiency(on_time: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let percent = on_time as f64 * 100.0 / total as f64;
    (percent * 100.0).round() / 100.0
}

/// Factory round table: one row per (checkpoint, expected round). A scan
/// fills a row when its checkpoint matches and either its recorded round
/// slot equals the round's scheduled time, or, for scans without a slot,
/// its scan time falls inside the round's tolerance window.
pub fn round_report(
    checkpoints: &[Checkpoint],
    expected: &[ExpectedCheckpoint],
    scans: &[ScanEvent],
) -> Vec<RoundReportRow> {
    let mut rows = Vec::with_capacity(checkpoints.len() * expected.len());

    for checkpoint in checkpoints {
        for round in expected {
            let hit = scans.iter().find(|scan| {
                scan.checkpoint_id == checkpoint.id
                    && match scan.round_slot {
                        Some(slot) => slot == round.scheduled_time,
                        None => {
                            scan.scan_time >= round.window_start
                                && scan.scan_time <= round.window_end
                        }
                    }
            });

            rows.push(match hit {
                Some(scan) => RoundReportRow {
                    round_number: round.round_number,
                    checkpoint_label: checkpoint.label.clone(),
                    scan_time: Some(scan.scan_time),
                    latitude: scan.latitude,
                    longitude: scan.longitude,
                    guard_name: Some(scan.guard_name.clone()),
                    status: ComplianceStatus::Success,
                },
                None => RoundReportRow {
                    round_number: round.round_number,
                    checkpoint_label: checkpoint.label.clone(),
                    scan_time: None,
                    latitude: None,
                    longitude: None,
                    guard_name: None,
                    status: ComplianceStatus::Missed,
                },
            });
        }
    }

    rows
}

/// Durable status proposal per scan under the nearest-neighbor policy.
/// Pure over (scan_time, schedule), so reruns propose identical values.
pub fn classify_for_date(
    scans: &[ScanEvent],
    expected: &[ExpectedCheckpoint],
    grace: Duration,
) -> Vec<(Uuid, ComplianceStatus)> {
    scans
        .iter()
        .map(|scan| {
            let nearest = matching::nearest_expected(expected, scan).map(|(_, diff)| diff);
            (scan.id, matching::classify_nearest(nearest, grace))
        })
        .collect()
}
