//! Display formatters for dates, times, money, and running time.
//!
//! All output follows the `ru-RU` conventions the booking UI is written for:
//! genitive month names, 24-hour clock, non-breaking-space digit grouping,
//! and tenge (`₸`) amounts. Timestamps are rendered in the UTC offset they
//! carry, so results do not depend on the host time zone.

#[cfg(test)]
#[path = "format_test.rs"]
mod format_test;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

/// Non-breaking space used by `ru-RU` for digit groups and currency suffixes.
const NBSP: char = '\u{a0}';
const CURRENCY_SIGN: char = '₸';

const MONTHS_GENITIVE: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("invalid timestamp `{0}`")]
    InvalidTimestamp(String),
}

fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, FormatError> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339).map_err(|_| FormatError::InvalidTimestamp(raw.to_owned()))
}

fn clock(dt: OffsetDateTime, raw: &str) -> Result<String, FormatError> {
    dt.format(format_description!("[hour]:[minute]")).map_err(|_| FormatError::InvalidTimestamp(raw.to_owned()))
}

/// Long date with time, e.g. `"5 февраля 2026 г. в 18:30"`.
///
/// # Errors
///
/// Returns [`FormatError::InvalidTimestamp`] if `raw` is not RFC 3339.
pub fn format_date(raw: &str) -> Result<String, FormatError> {
    let dt = parse_timestamp(raw)?;
    let month = MONTHS_GENITIVE[usize::from(u8::from(dt.month())) - 1];
    let time = clock(dt, raw)?;
    Ok(format!("{} {month} {} г. в {time}", dt.day(), dt.year()))
}

/// Hour and minute only, e.g. `"18:30"`.
///
/// # Errors
///
/// Returns [`FormatError::InvalidTimestamp`] if `raw` is not RFC 3339.
pub fn format_time(raw: &str) -> Result<String, FormatError> {
    let dt = parse_timestamp(raw)?;
    clock(dt, raw)
}

/// Tenge amount with grouped digits, e.g. `"1 500 ₸"` or `"99,5 ₸"`.
///
/// Whole amounts carry no fraction; others keep up to two fractional digits
/// with trailing zeros dropped.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let mut out = String::new();
    if amount < 0.0 && cents > 0 {
        out.push('-');
    }
    out.push_str(&group_thousands(whole));
    if fraction != 0 {
        let digits = format!("{fraction:02}");
        out.push(',');
        out.push_str(digits.trim_end_matches('0'));
    }
    out.push(NBSP);
    out.push(CURRENCY_SIGN);
    out
}

/// Running time as hours and minutes, e.g. `125` -> `"2ч 5м"`.
#[must_use]
pub fn format_duration(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    format!("{hours}ч {mins}м")
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(NBSP);
        }
        out.push(ch);
    }
    out
}
