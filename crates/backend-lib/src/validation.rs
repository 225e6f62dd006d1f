// ============================
// vview-backend-lib/src/validation.rs
// ============================
//! Input validation at the gateway boundary.
//!
//! Rejected payloads never reach the registry.

use thiserror::Error;

use crate::error::AppError;

/// Possible validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Display name must not be empty")]
    EmptyName,

    #[error("Display name exceeds {0} characters")]
    NameTooLong(usize),

    #[error("Chat message must not be empty")]
    EmptyMessage,

    #[error("Chat message exceeds {0} characters")]
    MessageTooLong(usize),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::MalformedInput(err.to_string())
    }
}

/// Result type for validation operations
pub type ValidationResult = Result<(), ValidationError>;

pub fn validate_display_name(name: &str, max_len: usize) -> ValidationResult {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.chars().count() > max_len {
        return Err(ValidationError::NameTooLong(max_len));
    }
    Ok(())
}

pub fn validate_chat_message(message: &str, max_len: usize) -> ValidationResult {
    if message.is_empty() {
        return Err(ValidationError::EmptyMessage);
    }
    if message.chars().count() > max_len {
        return Err(ValidationError::MessageTooLong(max_len));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_must_not_be_blank() {
        assert!(validate_display_name("Alice", 100).is_ok());
        assert!(matches!(
            validate_display_name("   ", 100),
            Err(ValidationError::EmptyName)
        ));
    }

    #[test]
    fn name_length_is_bounded() {
        let long = "x".repeat(101);
        assert!(matches!(
            validate_display_name(&long, 100),
            Err(ValidationError::NameTooLong(100))
        ));
    }

    #[test]
    fn chat_message_length_is_bounded() {
        assert!(validate_chat_message("Welcome", 2000).is_ok());
        assert!(matches!(
            validate_chat_message("", 2000),
            Err(ValidationError::EmptyMessage)
        ));
        let long = "x".repeat(2001);
        assert!(matches!(
            validate_chat_message(&long, 2000),
            Err(ValidationError::MessageTooLong(2000))
        ));
    }

    #[test]
    fn validation_errors_map_to_malformed_input() {
        let err: AppError = ValidationError::EmptyName.into();
        assert_eq!(err.error_code(), "malformed-input");
    }
}
