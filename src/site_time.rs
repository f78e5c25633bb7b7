use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::EngineError;

/// Every monitored site runs on the same fixed offset, UTC+05:30.
pub const SITE_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

pub fn site_offset() -> FixedOffset {
    FixedOffset::east_opt(SITE_OFFSET_SECS).expect("site offset is in range")
}

pub fn parse_report_date(input: &str) -> Result<NaiveDate, EngineError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| EngineError::InvalidDate(input.to_string()))
}

/// Normalizes a boundary timestamp to the site offset.
///
/// Accepts RFC 3339 with an explicit offset or `Z`, as well as naive
/// `YYYY-MM-DDTHH:MM:SS` (with optional fraction), which is taken to be
/// site-local.
pub fn parse_site_timestamp(input: &str) -> Result<DateTime<FixedOffset>, EngineError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Ok(parsed.with_timezone(&site_offset()));
    }

    let naive = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|_| EngineError::InvalidTimestamp(input.to_string()))?;

    naive
        .and_local_timezone(site_offset())
        .single()
        .ok_or_else(|| EngineError::InvalidTimestamp(input.to_string()))
}

/// Site-local wall-clock instant on `date`. Only called with valid
/// schedule constants.
pub fn site_datetime(date: NaiveDate, hour: u32, minute: u32) -> DateTime<FixedOffset> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).expect("schedule time is valid");
    date.and_time(time)
        .and_local_timezone(site_offset())
        .single()
        .expect("fixed offset local time is unambiguous")
}

/// Half-open [00:00, next day 00:00) bounds of a site-local calendar day.
pub fn day_bounds(date: NaiveDate) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let start = site_datetime(date, 0, 0);
    (start, start + Duration::days(1))
}
