use chrono::Duration;

use crate::models::{PatrolRound, ScanEvent};

pub const DEFAULT_ROUND_GAP_MINUTES: i64 = 30;

/// Groups a day of scans into patrol rounds without relying on expected
/// checkpoints: a gap longer than `gap` between consecutive scans starts
/// a new round. Input order does not matter; scans are sorted by time.
pub fn split_into_rounds(scans: &[ScanEvent], gap: Duration) -> Vec<PatrolRound> {
    let mut ordered: Vec<ScanEvent> = scans.to_vec();
    ordered.sort_by_key(|scan| scan.scan_time);

    let mut rounds: Vec<PatrolRound> = Vec::new();
    for scan in ordered {
        match rounds.last_mut() {
            Some(round) if scan.scan_time - round.end_time <= gap => {
                round.end_time = scan.scan_time;
                round.scans.push(scan);
            }
            _ => rounds.push(PatrolRound {
                start_time: scan.scan_time,
                end_time: scan.scan_time,
                scans: vec![scan],
            }),
        }
    }
    rounds
}
