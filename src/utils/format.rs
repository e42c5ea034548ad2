//! Number and date formatting for the ja-JP admin dashboard.

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Timelike, Utc,
};

/// Display offset for the given number of hours east of UTC.
///
/// Out-of-range values fall back to UTC.
pub fn display_offset(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours.saturating_mul(3600)).unwrap_or_else(|| Utc.fix())
}

/// Format a number with comma separators and at most three fraction digits.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rounded = format!("{:.3}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::new();
    if value < 0.0 && (int_part != "0" || !frac_part.is_empty()) {
        out.push('-');
    }
    out.push_str(&group_digits(int_part));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Yen amount with a `¥` prefix and grouped digits.
pub fn format_yen(value: f64) -> String {
    format!("¥{}", format_number(value))
}

/// Plain number without grouping (`5`, `5.2`, `-3.75`).
pub fn format_plain_number(value: f64) -> String {
    value.to_string()
}

fn group_digits(digits: &str) -> String {
    let mut result = String::new();
    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Parse a backend timestamp into the display offset.
///
/// Accepts RFC 3339, RFC 2822 (`Fri, 05 Jan 2024 10:00:00 GMT`), naive
/// date-times (read as display-local time) and bare dates (read as UTC
/// midnight).
pub fn parse_timestamp(raw: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&offset));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&offset));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return offset.from_local_datetime(&naive).single();
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(Utc.from_utc_datetime(&midnight).with_timezone(&offset));
    }
    None
}

/// ja-JP short date: `2024/1/5`.
pub fn format_date_ja(dt: &DateTime<FixedOffset>) -> String {
    format!("{}/{}/{}", dt.year(), dt.month(), dt.day())
}

/// ja-JP date and time: `2024/1/5 9:03:07`.
pub fn format_datetime_ja(dt: &DateTime<FixedOffset>) -> String {
    format!(
        "{} {}:{:02}:{:02}",
        format_date_ja(dt),
        dt.hour(),
        dt.minute(),
        dt.second()
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
