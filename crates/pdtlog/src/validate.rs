//! Field-level checks applied before records reach storage.
//!
//! Every helper returns the cleaned value (trimmed, upper-cased where the
//! field calls for it) or an [`Error::Validation`] naming the field.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Four-letter ICAO aerodrome code.
static ICAO_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{4}$").expect("ICAO pattern is valid"));

/// Loose e-mail shape; delivery is never attempted.
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("e-mail pattern is valid"));

/// Username characters accepted for pilot accounts.
static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern is valid"));

/// Required free text, trimmed, at most `max_len` characters.
///
/// # Errors
///
/// Returns a validation error if the value is blank or too long.
pub fn required(field: &'static str, value: &str, max_len: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::validation(field, "is required"));
    }
    check_len(field, value, max_len)?;
    Ok(value.to_string())
}

/// Optional free text; blank becomes `None`.
///
/// # Errors
///
/// Returns a validation error if the value is too long.
pub fn optional(field: &'static str, value: Option<&str>, max_len: usize) -> Result<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => {
            check_len(field, v, max_len)?;
            Ok(Some(v.to_string()))
        }
    }
}

fn check_len(field: &'static str, value: &str, max_len: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max_len {
        return Err(Error::validation(
            field,
            format!("must be at most {max_len} characters, got {len}"),
        ));
    }
    Ok(())
}

/// Aircraft registration marks, stored upper-case (`sp-abc` → `SP-ABC`).
///
/// # Errors
///
/// Returns a validation error if blank or longer than 20 characters.
pub fn registration_marks(value: &str) -> Result<String> {
    required("registration_marks", value, 20).map(|v| v.to_uppercase())
}

/// ICAO location code. Lower-case input is accepted and upper-cased.
///
/// # Errors
///
/// Returns a validation error unless the value is exactly four letters.
pub fn icao_code(field: &'static str, value: &str) -> Result<String> {
    let value = value.trim().to_uppercase();
    if ICAO_CODE.is_match(&value) {
        Ok(value)
    } else {
        Err(Error::validation(
            field,
            format!("ICAO code must be 4 uppercase letters, got '{value}'"),
        ))
    }
}

/// Optional e-mail address.
///
/// # Errors
///
/// Returns a validation error if present but malformed.
pub fn email(value: Option<&str>) -> Result<Option<String>> {
    let Some(value) = optional("email", value, 254)? else {
        return Ok(None);
    };
    if EMAIL.is_match(&value) {
        Ok(Some(value))
    } else {
        Err(Error::validation("email", format!("'{value}' is not an e-mail address")))
    }
}

/// Account username: letters, digits and `@.+-_`, at most 150 characters.
///
/// # Errors
///
/// Returns a validation error if blank, too long or containing other characters.
pub fn username(value: &str) -> Result<String> {
    let value = required("username", value, 150)?;
    if USERNAME.is_match(&value) {
        Ok(value)
    } else {
        Err(Error::validation(
            "username",
            "may contain only letters, digits and @/./+/-/_",
        ))
    }
}

/// A count that must be one or more (persons on board, landings).
///
/// # Errors
///
/// Returns a validation error if `value` is zero.
pub fn at_least_one(field: &'static str, value: u16) -> Result<u16> {
    if value == 0 {
        Err(Error::validation(field, "must be at least 1"))
    } else {
        Ok(value)
    }
}

/// A finite, non-negative quantity (litres, engine hours).
///
/// # Errors
///
/// Returns a validation error for negative, NaN or infinite values.
pub fn non_negative(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(Error::validation(field, format!("must be a number >= 0, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims() {
        assert_eq!(required("manufacturer", "  Cessna ", 255).unwrap(), "Cessna");
    }

    #[test]
    fn test_required_rejects_blank() {
        let err = required("manufacturer", "   ", 255).unwrap_err();
        assert!(err.to_string().contains("manufacturer"));
        assert!(err.to_string().contains("required"));
    }

    #[test]
    fn test_required_max_len_counts_chars() {
        assert!(required("phone_number", "ąąąąą", 5).is_ok());
        assert!(required("phone_number", "ąąąąąą", 5).is_err());
    }

    #[test]
    fn test_optional_blank_is_none() {
        assert_eq!(optional("notes", Some("  "), 10).unwrap(), None);
        assert_eq!(optional("notes", None, 10).unwrap(), None);
        assert_eq!(optional("notes", Some(" x "), 10).unwrap(), Some("x".to_string()));
    }

    #[test]
    fn test_registration_uppercased() {
        assert_eq!(registration_marks("sp-abc").unwrap(), "SP-ABC");
        assert!(registration_marks(&"X".repeat(21)).is_err());
    }

    #[test]
    fn test_icao_code() {
        assert_eq!(icao_code("departure_location", "epwa").unwrap(), "EPWA");
        assert_eq!(icao_code("departure_location", " EPKK ").unwrap(), "EPKK");
        assert!(icao_code("departure_location", "EPW").is_err());
        assert!(icao_code("departure_location", "EPWAA").is_err());
        assert!(icao_code("departure_location", "EP1A").is_err());
        assert!(icao_code("landing_location", "").is_err());
    }

    #[test]
    fn test_icao_error_names_field() {
        let err = icao_code("landing_location", "X").unwrap_err();
        assert!(err.to_string().contains("landing_location"));
    }

    #[test]
    fn test_email() {
        assert_eq!(
            email(Some("pilot@example.com")).unwrap(),
            Some("pilot@example.com".to_string())
        );
        assert_eq!(email(Some("")).unwrap(), None);
        assert!(email(Some("not-an-email")).is_err());
    }

    #[test]
    fn test_username() {
        assert_eq!(username("j.kowalski").unwrap(), "j.kowalski");
        assert!(username("jan kowalski").is_err());
        assert!(username("").is_err());
    }

    #[test]
    fn test_at_least_one() {
        assert_eq!(at_least_one("number_of_landings", 3).unwrap(), 3);
        assert!(at_least_one("number_of_landings", 0).is_err());
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative("fuel_added", 0.0).unwrap(), 0.0);
        assert_eq!(non_negative("fuel_added", 12.5).unwrap(), 12.5);
        assert!(non_negative("fuel_added", -0.01).is_err());
        assert!(non_negative("fuel_added", f64::NAN).is_err());
        assert!(non_negative("fuel_added", f64::INFINITY).is_err());
    }
}
