/// Custom `validator` functions shared by request DTOs

use rust_decimal::Decimal;
use std::borrow::Cow;
use validator::ValidationError;

fn failure(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

pub fn positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_positive() && !value.is_zero() {
        Ok(())
    } else {
        Err(failure("positive", "Must be greater than zero"))
    }
}

/// Italian postal code (CAP): exactly five digits
pub fn postal_code(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.len() == 5 && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(failure("postal_code", "Postal code must be 5 digits"))
    }
}

/// Two-letter province code, either case
pub fn province(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.len() == 2 && value.bytes().all(|b| b.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(failure("province", "Province must be 2 letters"))
    }
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(failure("blank", "Must not be blank"))
    } else {
        Ok(())
    }
}
