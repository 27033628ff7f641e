//! Validation Utilities

use validator::{ValidationError, ValidationErrors};

use super::error::{AppError, FieldError};

/// Convert validation errors to AppError
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let field_errors: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: e.message.clone().map(|m| m.to_string()).unwrap_or_default(),
            })
        })
        .collect();

    let message = field_errors
        .first()
        .map(|e| format!("{}: {}", e.field, e.message))
        .unwrap_or_else(|| "Validation failed".into());

    AppError::Validation(message)
}

/// Password strength rule: at least one uppercase letter, one lowercase
/// letter, and one digit. Minimum length is enforced separately by the
/// `length` validator on the request DTO.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if has_upper && has_lower && has_digit {
        Ok(())
    } else {
        Err(ValidationError::new("password_strength")
            .with_message("Password must contain an uppercase letter, a lowercase letter, and a digit".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_strength_accepts_mixed() {
        assert!(validate_password_strength("Passw0rd").is_ok());
    }

    #[test]
    fn test_password_strength_rejects_no_uppercase() {
        assert!(validate_password_strength("passw0rd").is_err());
    }

    #[test]
    fn test_password_strength_rejects_no_lowercase() {
        assert!(validate_password_strength("PASSW0RD").is_err());
    }

    #[test]
    fn test_password_strength_rejects_no_digit() {
        assert!(validate_password_strength("Password").is_err());
    }
}
