//! Tests for night and exposure id validation and calendar conversion.

use chrono::{Datelike, NaiveDate};
use eon_common::{EonError, ExposureId, Night};

// ============================================================================
// Night validation tests
// ============================================================================

#[test]
fn test_night_accepts_valid_dates() {
    for s in ["20000101", "20191231", "20240229", "20991231"] {
        let night = Night::parse(s).unwrap();
        assert_eq!(night.as_str(), s);
        assert_eq!(night.to_string(), s);
    }
}

#[test]
fn test_night_rejects_wrong_length() {
    for s in ["", "2024", "2024010", "202401011", "2024-01-01"] {
        assert!(matches!(Night::parse(s), Err(EonError::InvalidNight(_))), "{s}");
    }
}

#[test]
fn test_night_rejects_wrong_prefix() {
    for s in ["19991231", "21000101", "00000000", "30240101"] {
        assert!(Night::parse(s).is_err(), "{s}");
    }
}

#[test]
fn test_night_rejects_non_digits() {
    for s in ["2024O101", "20240l01", " 2024010", "2024010 ", "２0240101"] {
        assert!(Night::parse(s).is_err(), "{s}");
    }
}

#[test]
fn test_night_from_str() {
    let night: Night = "20240102".parse().unwrap();
    assert_eq!(night.as_str(), "20240102");
}

// ============================================================================
// Calendar conversion tests
// ============================================================================

#[test]
fn test_night_to_calendar_date() {
    let date = Night::parse("20240315").unwrap().to_calendar_date().unwrap();
    assert_eq!((date.year(), date.month(), date.day()), (2024, 3, 15));
}

#[test]
fn test_calendar_round_trip_every_day_of_leap_year() {
    let mut date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    while date < end {
        let night = Night::from_calendar_date(&date).unwrap();
        let back = night.to_calendar_date().unwrap();
        assert_eq!(back, date);
        date = date.succ_opt().unwrap();
    }
}

#[test]
fn test_calendar_date_outside_century_rejected() {
    let date = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
    assert!(Night::from_calendar_date(&date).is_err());
}

#[test]
fn test_impossible_night_date() {
    let night = Night::parse("20241399").unwrap();
    assert!(matches!(
        night.to_calendar_date(),
        Err(EonError::InvalidNight(_))
    ));
}

// ============================================================================
// Exposure id tests
// ============================================================================

#[test]
fn test_exposure_id_range_is_padded() {
    for value in [10_000u64, 10_001, 99_999, 100_000, 1_234_567, 99_999_999] {
        let id = ExposureId::parse(&value.to_string()).unwrap();
        assert_eq!(id.as_str().len(), 8);
        assert_eq!(id.value(), value);
        assert_eq!(id.as_str(), format!("{:08}", value));
    }
}

#[test]
fn test_exposure_id_from_number() {
    assert_eq!(ExposureId::from_number(54321.0).unwrap().as_str(), "00054321");
    assert!(ExposureId::from_number(9_999.0).is_err());
    assert!(ExposureId::from_number(100_000_000.0).is_err());
    assert!(ExposureId::from_number(f64::NAN).is_err());
    assert!(ExposureId::from_number(f64::INFINITY).is_err());
    assert!(ExposureId::from_number(12345.5).is_err());
}

#[test]
fn test_exposure_id_rejects_out_of_range_text() {
    for s in ["9999", "0", "-12345", "100000000", "123456789"] {
        assert!(
            matches!(ExposureId::parse(s), Err(EonError::InvalidExposureId(_))),
            "{s}"
        );
    }
}

#[test]
fn test_exposure_id_rejects_non_numeric() {
    for s in ["", "abc", "12a45", "NaN", "inf", "1234567x"] {
        assert!(ExposureId::parse(s).is_err(), "{s}");
    }
}

#[test]
fn test_exposure_id_canonical_form_unchanged() {
    assert_eq!(ExposureId::parse("00012345").unwrap().as_str(), "00012345");
    assert_eq!(ExposureId::parse("98765432").unwrap().as_str(), "98765432");
}

#[test]
fn test_exposure_id_trims_whitespace() {
    assert_eq!(ExposureId::parse(" 12345 ").unwrap().as_str(), "00012345");
}
