//! Night and exposure identifiers.
//!
//! A night is the `YYYYMMDD` observing-date label used for every asset path.
//! Exposure ids are canonically 8-digit zero-padded strings.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EonError, EonResult};

/// A validated observing night (`20YYMMDD`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Night(String);

impl Night {
    /// Validate a night string: exactly 8 ASCII digits starting with "20".
    pub fn parse(s: &str) -> EonResult<Self> {
        let valid = s.len() == 8 && s.starts_with("20") && s.bytes().all(|b| b.is_ascii_digit());
        if valid {
            Ok(Night(s.to_string()))
        } else {
            Err(EonError::InvalidNight(s.to_string()))
        }
    }

    /// Build a night from calendar fields (year, month, day), no timezone shift.
    pub fn from_calendar_date<D: Datelike>(date: &D) -> EonResult<Self> {
        let night = format!("{:04}{:02}{:02}", date.year(), date.month(), date.day());
        Self::parse(&night)
    }

    /// Calendar date for this night.
    ///
    /// Fails with `InvalidNight` when the digits do not name a real date
    /// (e.g. `20241399`).
    pub fn to_calendar_date(&self) -> EonResult<NaiveDate> {
        let field = |range: std::ops::Range<usize>| -> u32 {
            // All bytes are ASCII digits, so this cannot fail.
            self.0[range].parse().unwrap_or(0)
        };
        NaiveDate::from_ymd_opt(field(0..4) as i32, field(4..6), field(6..8))
            .ok_or_else(|| EonError::InvalidNight(self.0.clone()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Night {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Night {
    type Err = EonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Night::parse(s)
    }
}

impl AsRef<str> for Night {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Night {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Night {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Night::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A validated, zero-padded 8-digit exposure id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExposureId(String);

impl ExposureId {
    /// Smallest accepted exposure id.
    pub const MIN: u64 = 10_000;
    /// Largest accepted exposure id.
    pub const MAX: u64 = 99_999_999;

    /// Validate an exposure id given as text.
    ///
    /// An 8-digit string is accepted unchanged. Anything else is coerced to a
    /// number and must be an integer in `[MIN, MAX]`, then zero-padded.
    pub fn parse(s: &str) -> EonResult<Self> {
        if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(ExposureId(s.to_string()));
        }
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| EonError::InvalidExposureId(s.to_string()))?;
        Self::from_number(value).map_err(|_| EonError::InvalidExposureId(s.to_string()))
    }

    /// Validate a numeric exposure id.
    pub fn from_number(value: f64) -> EonResult<Self> {
        let in_range = value.is_finite()
            && value.fract() == 0.0
            && value >= Self::MIN as f64
            && value <= Self::MAX as f64;
        if !in_range {
            return Err(EonError::InvalidExposureId(value.to_string()));
        }
        Ok(ExposureId(format!("{:08}", value as u64)))
    }

    /// Numeric value of the id.
    pub fn value(&self) -> u64 {
        self.0.parse().unwrap_or(0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExposureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ExposureId {
    type Err = EonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExposureId::parse(s)
    }
}

impl Serialize for ExposureId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Exposure ids appear as bare numbers or strings in registry files.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawExposureId {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for ExposureId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawExposureId::deserialize(deserializer)? {
            RawExposureId::Number(n) => ExposureId::from_number(n),
            RawExposureId::Text(s) => ExposureId::parse(&s),
        }
        .map_err(serde::de::Error::custom)
    }
}
