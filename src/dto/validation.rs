//! Validation helpers for DTOs.

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use validator::ValidationError;

/// Validates that a string parses as an RFC 3339 instant.
///
/// # Examples
///
/// ```ignore
/// validate_rfc3339("2026-03-01T12:00:00Z") // Ok
/// validate_rfc3339("not-a-date")           // Err
/// validate_rfc3339("")                     // Err
/// ```
pub fn validate_rfc3339(value: &str) -> Result<(), ValidationError> {
    if OffsetDateTime::parse(value, &Rfc3339).is_err() {
        let mut err = ValidationError::new("rfc3339");
        err.message = Some(format!("`{value}` is not a valid RFC 3339 instant").into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_instants() {
        assert!(validate_rfc3339("2026-03-01T12:00:00Z").is_ok());
        assert!(validate_rfc3339("2026-03-01T12:00:00+02:00").is_ok());
        assert!(validate_rfc3339("2026-03-01T12:00:00.250Z").is_ok());
    }

    #[test]
    fn rejects_malformed_instants() {
        assert!(validate_rfc3339("").is_err());
        assert!(validate_rfc3339("not-a-date").is_err());
        assert!(validate_rfc3339("2026-03-01").is_err()); // date without time
        assert!(validate_rfc3339("2026-13-01T12:00:00Z").is_err()); // month 13
    }
}
