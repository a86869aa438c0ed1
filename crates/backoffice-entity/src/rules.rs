//! Shared field rules for input DTOs.

use std::borrow::Cow;

use validator::ValidationError;

/// Maximum length of every short text column.
pub const MAX_TEXT_LEN: u64 = 255;

/// Reject empty or whitespace-only text.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("required");
        error.message = Some(Cow::Borrowed("This field is required."));
        return Err(error);
    }
    Ok(())
}

/// Trim an optional text value, collapsing blanks to `None`.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("admin").is_ok());
        let err = not_blank("  ").unwrap_err();
        assert_eq!(err.code, "required");
    }

    #[test]
    fn test_blank_to_none() {
        assert_eq!(blank_to_none(Some("  ".into())), None);
        assert_eq!(blank_to_none(Some(" x ".into())), Some("x".to_string()));
        assert_eq!(blank_to_none(None), None);
    }
}
