//! Lenient conversions from raw CRM property strings.
//!
//! Nothing here fails: absent, blank or malformed input becomes `None`, and so
//! does anything the mirror columns cannot store.

use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use super::models::Properties;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// `numeric(15,2)` keeps 13 digits before the decimal point.
const AMOUNT_INTEGER_DIGITS: u32 = 13;

/// Years that survive the RFC 3339 rendering used for `COPY`.
const TIMESTAMP_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

fn raw<'a>(props: &'a Properties, name: &str) -> Option<&'a str> {
    props
        .get(name)
        .and_then(|v| v.as_deref())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Text property; absent or whitespace-only becomes `None`. NUL characters,
/// which Postgres text cannot hold, are dropped.
pub fn text(props: &Properties, name: &str) -> Option<String> {
    props
        .get(name)
        .and_then(|v| v.as_deref())
        .map(|v| v.replace('\0', ""))
        .filter(|v| !v.trim().is_empty())
}

pub fn amount(props: &Properties, name: &str) -> Option<Decimal> {
    raw(props, name).and_then(parse_amount)
}

pub fn timestamp(props: &Properties, name: &str) -> Option<DateTime<Utc>> {
    raw(props, name).and_then(parse_timestamp)
}

/// Parse a monetary amount such as `1500`, `1500.50` or `1.5e3`. Values that
/// would overflow `numeric(15,2)` once rounded to cents are rejected.
pub fn parse_amount(value: &str) -> Option<Decimal> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let amount = Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()?;

    let limit = Decimal::from(10i64.pow(AMOUNT_INTEGER_DIGITS));
    let stored = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    (stored.abs() < limit).then_some(amount)
}

/// Parse an ISO-8601 timestamp. A trailing `Z` or an explicit offset is
/// honoured; naive date-times and bare dates are taken as UTC. Years outside
/// 1..=9999 are rejected.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    parse_any_timestamp(value).filter(|ts| TIMESTAMP_YEARS.contains(&ts.year()))
}

fn parse_any_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
