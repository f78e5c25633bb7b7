use std::fmt::Write;

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::models::{
    ComplianceStatus, Factory, GuardComplianceReport, PatrolRound, RoundReportRow,
};

pub fn build_guard_report(report: &GuardComplianceReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Patrol Compliance — {}", report.guard_name);
    let _ = writeln!(output, "Report date {}", report.report_date);
    let _ = writeln!(output);
    let _ = writeln!(output, "- Expected rounds: {}", report.total_expected);
    let _ = writeln!(output, "- On time: {}", report.on_time_count);
    let _ = writeln!(output, "- Missed: {}", report.missed_count);
    let _ = writeln!(output, "- Efficiency: {:.2}%", report.efficiency_percent);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Missed Rounds");

    if report.missed_details.is_empty() {
        let _ = writeln!(output, "Every expected round was covered.");
    } else {
        for missed in report.missed_details.iter() {
            let _ = writeln!(output, "- {} ({})", missed.expected_time, missed.status.as_str());
        }
    }

    output
}

pub fn build_round_report(factory: &Factory, date: NaiveDate, rows: &[RoundReportRow]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {}", factory.factory_name);
    let _ = writeln!(output, "{}", factory.factory_address);
    let _ = writeln!(output);
    let _ = writeln!(output, "Patrol round report for {date}");
    let _ = writeln!(output);

    if rows.is_empty() {
        let _ = writeln!(output, "No checkpoints monitored for this factory.");
        return output;
    }

    let _ = writeln!(output, "| Round | Checkpoint | Scan Time | Guard | Status |");
    let _ = writeln!(output, "|-------|------------|-----------|-------|--------|");
    for row in rows.iter() {
        let scan_time = row
            .scan_time
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        let guard = row.guard_name.as_deref().unwrap_or("-");
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} |",
            row.round_number,
            row.checkpoint_label,
            scan_time,
            guard,
            row.status.as_str()
        );
    }

    let covered = rows
        .iter()
        .filter(|row| row.status == ComplianceStatus::Success)
        .count();
    let _ = writeln!(output);
    let _ = writeln!(output, "{covered} of {} rounds covered.", rows.len());

    output
}

pub fn build_patrol_log(factory: &Factory, date: NaiveDate, rounds: &[PatrolRound]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {}", factory.factory_name);
    let _ = writeln!(output, "{}", factory.factory_address);
    let _ = writeln!(output);
    let _ = writeln!(output, "Security patrol log for {date}");
    let _ = writeln!(output);

    if rounds.is_empty() {
        let _ = writeln!(output, "No scans recorded for this date.");
        return output;
    }

    for (index, round) in rounds.iter().enumerate() {
        let _ = writeln!(
            output,
            "## Round {} | {} — {}",
            index + 1,
            round.start_time.format("%I:%M %p"),
            round.end_time.format("%I:%M %p")
        );
        let _ = writeln!(output, "| Guard | Time | Location | Latitude | Longitude |");
        let _ = writeln!(output, "|-------|------|----------|----------|-----------|");
        for scan in round.scans.iter() {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} |",
                scan.guard_name,
                scan.scan_time.format("%I:%M %p"),
                scan.checkpoint_label,
                scan.latitude.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()),
                scan.longitude.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
            );
        }
        let _ = writeln!(output);
    }

    output
}

/// Audit-friendly report filename: type, factory, date, requesting user,
/// and generation timestamp.
pub fn build_report_filename(
    report_type: &str,
    factory_code: &str,
    report_date: NaiveDate,
    user_name: Option<&str>,
    generated_at: DateTime<FixedOffset>,
) -> String {
    let safe_name = user_name.unwrap_or("UNKNOWN").replace(' ', "_");
    format!(
        "{report_type}_{factory_code}_{report_date}_{safe_name}_{}.md",
        generated_at.format("%Y%m%d_%H%M%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MissedRound;
    use crate::site_time::site_datetime;

    fn factory() -> Factory {
        Factory {
            factory_code: "F1".to_string(),
            factory_name: "Coimbatore Spinning Mill".to_string(),
            factory_address: "Avinashi Road, Coimbatore".to_string(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 22).unwrap()
    }

    #[test]
    fn guard_report_lists_missed_rounds() {
        let report = GuardComplianceReport {
            guard_name: "Ravi Kumar".to_string(),
            report_date: date(),
            total_expected: 34,
            on_time_count: 30,
            missed_count: 4,
            efficiency_percent: 88.24,
            missed_details: vec![MissedRound {
                expected_time: "05:30".to_string(),
                status: ComplianceStatus::Missed,
            }],
        };

        let text = build_guard_report(&report);
        assert!(text.contains("Efficiency: 88.24%"));
        assert!(text.contains("- 05:30 (MISSED)"));
    }

    #[test]
    fn round_report_renders_one_row_per_round() {
        let rows = vec![
            RoundReportRow {
                round_number: 1,
                checkpoint_label: "QR1".to_string(),
                scan_time: Some(site_datetime(date(), 12, 0)),
                latitude: Some(11.0),
                longitude: Some(76.9),
                guard_name: Some("Ravi Kumar".to_string()),
                status: ComplianceStatus::Success,
            },
            RoundReportRow {
                round_number: 2,
                checkpoint_label: "QR1".to_string(),
                scan_time: None,
                latitude: None,
                longitude: None,
                guard_name: None,
                status: ComplianceStatus::Missed,
            },
        ];

        let text = build_round_report(&factory(), date(), &rows);
        assert!(text.contains("| 1 | QR1 | 12:00:00 | Ravi Kumar | SUCCESS |"));
        assert!(text.contains("| 2 | QR1 | - | - | MISSED |"));
        assert!(text.contains("1 of 2 rounds covered."));
    }

    #[test]
    fn filename_is_audit_friendly() {
        let generated_at = site_datetime(date(), 14, 30);
        let name = build_report_filename("PATROL_ROUND", "F1", date(), Some("Anita Rao"), generated_at);
        assert_eq!(name, "PATROL_ROUND_F1_2026-01-22_Anita_Rao_20260122_143000.md");

        let anonymous = build_report_filename("PATROL_LOG", "F1", date(), None, generated_at);
        assert!(anonymous.contains("_UNKNOWN_"));
    }
}
