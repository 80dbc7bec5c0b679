//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a raffle seed is 8 to 64 lowercase hexadecimal characters.
///
/// # Examples
///
/// ```ignore
/// validate_seed("deadbeef00112233") // Ok
/// validate_seed("DEADBEEF00112233") // Err - uppercase
/// validate_seed("abc")              // Err - too short
/// ```
pub fn validate_seed(seed: &str) -> Result<(), ValidationError> {
    if !(8..=64).contains(&seed.len()) {
        let mut err = ValidationError::new("seed_length");
        err.message =
            Some(format!("Seed must be 8 to 64 characters (got {})", seed.len()).into());
        return Err(err);
    }

    if !seed
        .chars()
        .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
    {
        let mut err = ValidationError::new("seed_format");
        err.message = Some("Seed must contain only lowercase hexadecimal characters".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_seed_valid() {
        assert!(validate_seed("deadbeef").is_ok());
        assert!(validate_seed("0123456789abcdef0123456789abcdef").is_ok());
    }

    #[test]
    fn test_validate_seed_invalid_length() {
        assert!(validate_seed("abc").is_err()); // too short
        assert!(validate_seed(&"a".repeat(65)).is_err()); // too long
        assert!(validate_seed("").is_err()); // empty
    }

    #[test]
    fn test_validate_seed_invalid_format() {
        assert!(validate_seed("DEADBEEF").is_err()); // uppercase
        assert!(validate_seed("deadbeeg").is_err()); // invalid hex
        assert!(validate_seed("dead beef").is_err()); // space
    }
}
