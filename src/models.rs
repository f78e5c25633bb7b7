use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Factory {
    pub factory_code: String,
    pub factory_name: String,
    pub factory_address: String,
}

#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub id: Uuid,
    pub factory_code: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanEvent {
    pub id: Uuid,
    pub guard_name: String,
    pub checkpoint_id: Uuid,
    pub checkpoint_label: String,
    pub scan_time: DateTime<FixedOffset>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub factory_code: String,
    pub round_slot: Option<DateTime<FixedOffset>>,
    pub status: Option<ComplianceStatus>,
}

/// Canonical compliance status. The legacy labels still found in stored
/// rows and older payloads are accepted as read-side aliases only; the
/// engine always writes the canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplianceStatus {
    #[serde(rename = "SUCCESS", alias = "ON_TIME", alias = "COMPLETED", alias = "DONE")]
    Success,
    #[serde(rename = "LATE")]
    Late,
    #[serde(rename = "MISSED", alias = "FAILED")]
    Missed,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Success => "SUCCESS",
            ComplianceStatus::Late => "LATE",
            ComplianceStatus::Missed => "MISSED",
        }
    }

    pub fn parse(raw: &str) -> Option<ComplianceStatus> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" | "ON_TIME" | "COMPLETED" | "DONE" => Some(ComplianceStatus::Success),
            "LATE" => Some(ComplianceStatus::Late),
            "MISSED" | "FAILED" => Some(ComplianceStatus::Missed),
            _ => None,
        }
    }
}

/// One expected patrol round, derived fresh per report date.
/// `window_start <= scheduled_time <= window_end` always holds; the
/// window is the grace tolerance around the scheduled time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpectedCheckpoint {
    pub round_number: u32,
    pub scheduled_time: DateTime<FixedOffset>,
    pub window_start: DateTime<FixedOffset>,
    pub window_end: DateTime<FixedOffset>,
}

/// Pairing of one expected round with at most one scan.
/// `distance_seconds` is infinite when no scan qualified.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub expected: ExpectedCheckpoint,
    pub scan: Option<ScanEvent>,
    pub distance_seconds: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissedRound {
    pub expected_time: String,
    pub status: ComplianceStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuardComplianceReport {
    pub guard_name: String,
    pub report_date: NaiveDate,
    pub total_expected: usize,
    pub on_time_count: usize,
    pub missed_count: usize,
    pub efficiency_percent: f64,
    pub missed_details: Vec<MissedRound>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundReportRow {
    pub round_number: u32,
    pub checkpoint_label: String,
    pub scan_time: Option<DateTime<FixedOffset>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub guard_name: Option<String>,
    pub status: ComplianceStatus,
}

/// A contiguous run of scans inferred by the round grouper.
#[derive(Debug, Clone)]
pub struct PatrolRound {
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub scans: Vec<ScanEvent>,
}

/// Outcome of a batch status recomputation. `total_processed` counts
/// attempted updates, `updated_count` the ones that succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct RecomputeOutcome {
    pub total_expected: usize,
    pub total_processed: usize,
    pub updated_count: usize,
    pub failed_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_legacy_labels() {
        assert_eq!(ComplianceStatus::parse("SUCCESS"), Some(ComplianceStatus::Success));
        assert_eq!(ComplianceStatus::parse("on_time"), Some(ComplianceStatus::Success));
        assert_eq!(ComplianceStatus::parse("completed"), Some(ComplianceStatus::Success));
        assert_eq!(ComplianceStatus::parse("FAILED"), Some(ComplianceStatus::Missed));
        assert_eq!(ComplianceStatus::parse("late"), Some(ComplianceStatus::Late));
        assert_eq!(ComplianceStatus::parse("bogus"), None);
    }

    #[test]
    fn serializes_canonical_labels_only() {
        assert_eq!(
            serde_json::to_string(&ComplianceStatus::Missed).unwrap(),
            "\"MISSED\""
        );
        let from_alias: ComplianceStatus = serde_json::from_str("\"FAILED\"").unwrap();
        assert_eq!(from_alias, ComplianceStatus::Missed);
    }
}
