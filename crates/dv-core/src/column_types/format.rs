//! Value formatting and calendar helpers

use chrono::{Days, NaiveDate};

use crate::CoreError;

/// Insert thousands separators into a run of ASCII digits
pub fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format a number with a fixed number of decimals and thousands separators
pub fn format_number(value: f64, decimal_places: usize, no_trailing_zeroes: bool) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.*}", decimal_places, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::new();
    // Values that round to zero lose their sign
    if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));

    if let Some(frac) = frac_part {
        let frac = if no_trailing_zeroes {
            frac.trim_end_matches('0')
        } else {
            frac
        };
        if !frac.is_empty() {
            out.push('.');
            out.push_str(frac);
        }
    }
    out
}

/// Format a calendar year; negative years are shown as BCE
pub fn format_year(year: i64) -> String {
    if year < 0 {
        format!("{} BCE", group_thousands(&year.unsigned_abs().to_string()))
    } else {
        year.to_string()
    }
}

/// Format a day offset from `epoch` as e.g. "Jan 21, 2020"
pub fn format_day(day: i64, epoch: NaiveDate) -> String {
    let date = if day >= 0 {
        epoch.checked_add_days(Days::new(day as u64))
    } else {
        epoch.checked_sub_days(Days::new(day.unsigned_abs()))
    };

    match date {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => day.to_string(),
    }
}

/// Parse an ISO `YYYY-MM-DD` date
pub fn parse_date(raw: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| CoreError::InvalidDate(raw.to_string()))
}

/// Signed number of days from `b` to `a`
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    a.signed_duration_since(b).num_days()
}
