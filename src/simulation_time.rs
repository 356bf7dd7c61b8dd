use anyhow::anyhow;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

fn is_leap_day(timestamp: &NaiveDateTime) -> bool {
    timestamp.month() == 2 && timestamp.day() == 29
}

/// Timestamps for an hourly horizon starting at midnight on 1 January of `year`.
///
/// 29 February is skipped, so 8760 hours always span 1 January to 31 December, matching how
/// hourly weather and demand files index their rows.
pub fn hourly_timestamps(year: i32, hours: usize) -> anyhow::Result<Vec<NaiveDateTime>> {
    let mut current = NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| anyhow!("Year {year} cannot be represented as a date"))?;

    let mut timestamps = Vec::with_capacity(hours);
    while timestamps.len() < hours {
        if !is_leap_day(&current) {
            timestamps.push(current);
        }
        current = current
            .checked_add_signed(Duration::hours(1))
            .ok_or_else(|| anyhow!("Hour after {current} is out of range"))?;
    }

    Ok(timestamps)
}

/// Format used for the `Date` column of the results.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
