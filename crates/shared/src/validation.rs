//! Common validation and normalization utilities.

use chrono::{DateTime, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Wire format for purchase timestamps supplied by the payment provider.
pub const PURCHASE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

lazy_static! {
    static ref PHONE_RE: Regex = Regex::new(r"^1[3-9]\d{9}$").expect("valid phone regex");
}

/// Normalizes a display name: trims and collapses runs of whitespace to a
/// single space.
///
/// Catalog names are compared post-normalization, so "Python  Basics " and
/// "Python Basics" resolve to the same record.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Validates a mainland mobile number (11 digits, `1[3-9]` prefix).
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE_RE.is_match(phone) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone_format");
        err.message = Some("Phone must be a valid 11-digit mobile number".into());
        Err(err)
    }
}

/// Parses a purchase timestamp in `YYYY-MM-DD HH:MM:SS` form.
///
/// The provider exports local wall-clock times with no offset; they are
/// stored as UTC verbatim.
pub fn parse_purchase_time(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    NaiveDateTime::parse_from_str(raw.trim(), PURCHASE_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| {
            let mut err = ValidationError::new("purchase_time_format");
            err.message =
                Some("purchase_time must use the 'YYYY-MM-DD HH:MM:SS' format".into());
            err
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_normalize_name_collapses_whitespace() {
        assert_eq!(normalize_name("  Python   Basics "), "Python Basics");
        assert_eq!(normalize_name("数据分析\t入门"), "数据分析 入门");
        assert_eq!(normalize_name("solo"), "solo");
    }

    #[test]
    fn test_normalize_name_empty() {
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn test_validate_phone_accepts_mobile_numbers() {
        assert!(validate_phone("13800000000").is_ok());
        assert!(validate_phone("19912345678").is_ok());
    }

    #[test]
    fn test_validate_phone_rejects_bad_input() {
        assert!(validate_phone("12800000000").is_err()); // bad second digit
        assert!(validate_phone("1380000000").is_err()); // too short
        assert!(validate_phone("138000000001").is_err()); // too long
        assert!(validate_phone("abcdefghijk").is_err());
    }

    #[test]
    fn test_parse_purchase_time() {
        let parsed = parse_purchase_time("2024-06-15 14:30:45").unwrap();
        assert_eq!(parsed.year(), 2024);
        assert_eq!(parsed.month(), 6);
        assert_eq!(parsed.hour(), 14);
        assert_eq!(parsed.second(), 45);
    }

    #[test]
    fn test_parse_purchase_time_trims() {
        assert!(parse_purchase_time(" 2024-01-01 00:00:00 ").is_ok());
    }

    #[test]
    fn test_parse_purchase_time_rejects_other_formats() {
        assert!(parse_purchase_time("2024-06-15T14:30:45Z").is_err());
        assert!(parse_purchase_time("15/06/2024 14:30").is_err());
        assert!(parse_purchase_time("").is_err());
    }
}
