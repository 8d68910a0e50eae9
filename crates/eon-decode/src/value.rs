//! Typed table cells and automatic per-cell type inference.

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::{Serialize, Serializer};

/// A single table cell after type inference.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty or missing field
    Null,
    Number(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    /// Anything that is not recognizably one of the above, kept verbatim
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Short name of the inferred type, used in logs and API summaries.
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::Number(_) => "number",
            CellValue::Boolean(_) => "boolean",
            CellValue::Date(_) => "date",
            CellValue::Text(_) => "string",
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_none(),
            CellValue::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            CellValue::Number(_) => serializer.serialize_none(),
            CellValue::Boolean(b) => serializer.serialize_bool(*b),
            CellValue::Date(d) => {
                serializer.serialize_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            CellValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Infer the type of a raw field.
///
/// The field is trimmed, then tried in order as: empty (null), `true`/`false`,
/// `NaN`, a numeric literal, an ISO-8601 date. If nothing matches the
/// original, untrimmed text is kept.
pub fn infer_cell(raw: &str) -> CellValue {
    let value = raw.trim();
    if value.is_empty() {
        CellValue::Null
    } else if value == "true" {
        CellValue::Boolean(true)
    } else if value == "false" {
        CellValue::Boolean(false)
    } else if value == "NaN" {
        CellValue::Number(f64::NAN)
    } else if let Some(n) = parse_number(value) {
        CellValue::Number(n)
    } else if let Some(d) = parse_iso_date(value) {
        CellValue::Date(d)
    } else {
        CellValue::Text(raw.to_string())
    }
}

/// Parse a numeric literal: signed decimals with optional exponent,
/// `Infinity`, and unsigned `0x`/`0o`/`0b` integers.
fn parse_number(s: &str) -> Option<f64> {
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
                return None;
            }
            return u64::from_str_radix(digits, radix).ok().map(|v| v as f64);
        }
    }

    let (sign, body) = match s.as_bytes().first()? {
        b'+' => (1.0, &s[1..]),
        b'-' => (-1.0, &s[1..]),
        _ => (1.0, s),
    };
    if body == "Infinity" {
        return Some(sign * f64::INFINITY);
    }
    if !is_decimal_literal(body) {
        return None;
    }
    body.parse::<f64>().ok().map(|v| sign * v)
}

fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    let mut mantissa_digits = 0;

    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        mantissa_digits += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            mantissa_digits += 1;
        }
    }
    if mantissa_digits == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exponent_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exponent_start {
            return false;
        }
    }
    i == bytes.len()
}

fn fixed_digits(s: &str, width: usize) -> Option<u32> {
    if s.len() == width && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

/// Parse `YYYY[-MM[-DD]][THH:MM[:SS[.sss]][Z|±HH:MM]]`.
///
/// Date-only values and times without a zone are taken as UTC.
fn parse_iso_date(s: &str) -> Option<DateTime<Utc>> {
    let (date_part, time_part) = match s.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (s, None),
    };

    let mut fields = date_part.split('-');
    let year = fixed_digits(fields.next()?, 4)?;
    let month = match fields.next() {
        Some(m) => fixed_digits(m, 2)?,
        None => 1,
    };
    let day = match fields.next() {
        Some(d) => fixed_digits(d, 2)?,
        None => 1,
    };
    if fields.next().is_some() {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(year as i32, month, day)?;

    let Some(time) = time_part else {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    };

    let (clock, offset_minutes) = if let Some(clock) = time.strip_suffix('Z') {
        (clock, 0i64)
    } else if time.len() > 6 && matches!(time.as_bytes()[time.len() - 6], b'+' | b'-') {
        let (clock, zone) = time.split_at(time.len() - 6);
        let sign = if zone.starts_with('-') { -1 } else { 1 };
        let (hours, minutes) = zone[1..].split_once(':')?;
        let minutes = fixed_digits(hours, 2)? as i64 * 60 + fixed_digits(minutes, 2)? as i64;
        (clock, sign * minutes)
    } else {
        (time, 0)
    };

    let mut parts = clock.split(':');
    let hour = fixed_digits(parts.next()?, 2)?;
    let minute = fixed_digits(parts.next()?, 2)?;
    let (second, millis) = match parts.next() {
        None => (0, 0),
        Some(sec) => match sec.split_once('.') {
            Some((whole, frac)) => (fixed_digits(whole, 2)?, fixed_digits(frac, 3)?),
            None => (fixed_digits(sec, 2)?, 0),
        },
    };
    if parts.next().is_some() {
        return None;
    }

    let naive = date.and_hms_milli_opt(hour, minute, second, millis)?;
    Some(Utc.from_utc_datetime(&(naive - Duration::minutes(offset_minutes))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_infer_null_and_booleans() {
        assert_eq!(infer_cell(""), CellValue::Null);
        assert_eq!(infer_cell("   "), CellValue::Null);
        assert_eq!(infer_cell("true"), CellValue::Boolean(true));
        assert_eq!(infer_cell(" false "), CellValue::Boolean(false));
        // Only lowercase literals are booleans.
        assert_eq!(infer_cell("True"), CellValue::Text("True".into()));
    }

    #[test]
    fn test_infer_numbers() {
        assert_eq!(infer_cell("42"), CellValue::Number(42.0));
        assert_eq!(infer_cell("-3.5"), CellValue::Number(-3.5));
        assert_eq!(infer_cell("+.5"), CellValue::Number(0.5));
        assert_eq!(infer_cell("5."), CellValue::Number(5.0));
        assert_eq!(infer_cell("1e3"), CellValue::Number(1000.0));
        assert_eq!(infer_cell("2.5E-2"), CellValue::Number(0.025));
        assert_eq!(infer_cell("0x1F"), CellValue::Number(31.0));
        assert_eq!(infer_cell("-Infinity"), CellValue::Number(f64::NEG_INFINITY));
        assert!(infer_cell("NaN").as_f64().unwrap().is_nan());
        // A bare year is a number, not a date.
        assert_eq!(infer_cell("2024"), CellValue::Number(2024.0));
    }

    #[test]
    fn test_infer_rejects_rust_only_number_forms() {
        assert_eq!(infer_cell("inf"), CellValue::Text("inf".into()));
        assert_eq!(infer_cell("nan"), CellValue::Text("nan".into()));
        assert_eq!(infer_cell("1e"), CellValue::Text("1e".into()));
        assert_eq!(infer_cell("."), CellValue::Text(".".into()));
        assert_eq!(infer_cell("-0x10"), CellValue::Text("-0x10".into()));
    }

    #[test]
    fn test_infer_dates() {
        let d = infer_cell("2024-03-15").as_date().unwrap();
        assert_eq!((d.year(), d.month(), d.day(), d.hour()), (2024, 3, 15, 0));

        let d = infer_cell("2024-03").as_date().unwrap();
        assert_eq!((d.month(), d.day()), (3, 1));

        let d = infer_cell("2024-03-15T10:20:30.250Z").as_date().unwrap();
        assert_eq!((d.hour(), d.minute(), d.second()), (10, 20, 30));
        assert_eq!(d.timestamp_subsec_millis(), 250);

        let d = infer_cell("2024-03-15T10:20-07:00").as_date().unwrap();
        assert_eq!((d.hour(), d.minute()), (17, 20));
    }

    #[test]
    fn test_infer_invalid_dates_stay_text() {
        assert_eq!(infer_cell("2024-13-01"), CellValue::Text("2024-13-01".into()));
        assert_eq!(
            infer_cell("2024-03-15T10"),
            CellValue::Text("2024-03-15T10".into())
        );
        assert_eq!(infer_cell("M01234"), CellValue::Text("M01234".into()));
    }

    #[test]
    fn test_text_keeps_original_whitespace() {
        assert_eq!(infer_cell(" hello "), CellValue::Text(" hello ".into()));
    }

    #[test]
    fn test_serialize_cells() {
        let json = serde_json::to_string(&vec![
            CellValue::Null,
            CellValue::Number(1.5),
            CellValue::Number(f64::NAN),
            CellValue::Boolean(true),
            CellValue::Text("x".into()),
        ])
        .unwrap();
        assert_eq!(json, r#"[null,1.5,null,true,"x"]"#);
    }
}
