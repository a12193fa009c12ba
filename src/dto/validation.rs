//! Validation helpers for DTOs.

use validator::ValidationError;

/// Length of every generated room code.
pub const ROOM_CODE_LENGTH: usize = 6;

/// Validates that a room code is exactly six uppercase ASCII letters or digits.
///
/// # Examples
///
/// ```ignore
/// validate_room_code("ABC123") // Ok
/// validate_room_code("abc123") // Err - lowercase
/// validate_room_code("ABC12")  // Err - too short
/// ```
pub fn validate_room_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != ROOM_CODE_LENGTH {
        let mut err = ValidationError::new("room_code_length");
        err.message = Some(
            format!(
                "Room code must be exactly {ROOM_CODE_LENGTH} characters (got {})",
                code.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        let mut err = ValidationError::new("room_code_format");
        err.message = Some("Room code must contain only uppercase letters and digits".into());
        return Err(err);
    }

    Ok(())
}
