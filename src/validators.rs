/// Input validators module - rejects malformed requests before they are sent
/// Features:
/// 1. Indian mobile number, pincode and OTP formats
/// 2. Email and person-name checks
/// 3. GST and business registration number formats
/// 4. Length limits shared by the request validators in `services`

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_NAME_LENGTH: usize = 50;
pub const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321

lazy_static! {
    static ref PHONE_REGEX: Regex = Regex::new(r"^[6-9][0-9]{9}$").unwrap();
    static ref PINCODE_REGEX: Regex = Regex::new(r"^[1-9][0-9]{5}$").unwrap();
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    static ref OTP_REGEX: Regex = Regex::new(r"^[0-9]{6}$").unwrap();
    static ref GST_REGEX: Regex =
        Regex::new(r"^[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z][1-9A-Z]Z[0-9A-Z]$").unwrap();
    static ref REGISTRATION_NUMBER_REGEX: Regex = Regex::new(r"^[A-Z0-9]{10,20}$").unwrap();
}

/// Validates a 10-digit Indian mobile number (leading 6-9).
pub fn is_valid_phone(phone: &str) -> Result<String, ValidationError> {
    let trimmed = phone.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("Phone number"));
    }

    if !PHONE_REGEX.is_match(trimmed) {
        return Err(ValidationError::Rule(
            "Please enter a valid 10-digit mobile number".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

pub fn is_valid_pincode(pincode: &str) -> Result<String, ValidationError> {
    let trimmed = pincode.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("Pincode"));
    }

    if !PINCODE_REGEX.is_match(trimmed) {
        return Err(ValidationError::Rule(
            "Please enter a valid 6-digit pincode".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

/// Validates an email address
/// - Rejects whitespace and missing `@` or domain dot
/// - Enforces the RFC 5321 length limit
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("Email"));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("Email", MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    Ok(trimmed.to_string())
}

pub fn is_valid_otp(otp: &str) -> Result<String, ValidationError> {
    let trimmed = otp.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("OTP"));
    }

    if !OTP_REGEX.is_match(trimmed) {
        return Err(ValidationError::Rule("OTP must be 6 digits".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Validates a person's first or last name
pub fn is_valid_name(name: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }

    let length = trimmed.chars().count();
    if length < MIN_NAME_LENGTH {
        return Err(ValidationError::TooShort(field, MIN_NAME_LENGTH));
    }

    if length > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong(field, MAX_NAME_LENGTH));
    }

    if trimmed.chars().any(|c| c.is_control()) {
        return Err(ValidationError::InvalidFormat(field));
    }

    Ok(trimmed.to_string())
}

pub fn is_valid_gst_number(gst: &str) -> Result<String, ValidationError> {
    let trimmed = gst.trim();

    if !GST_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("GST number"));
    }

    Ok(trimmed.to_string())
}

pub fn is_valid_registration_number(number: &str) -> Result<String, ValidationError> {
    let trimmed = number.trim();

    if !REGISTRATION_NUMBER_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("business registration number"));
    }

    Ok(trimmed.to_string())
}

/// Trimmed, non-empty value no longer than `max` characters.
pub fn required(value: &str, field: &'static str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }

    max_length(trimmed, field, max)
}

pub fn max_length(value: &str, field: &'static str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong(field, max));
    }

    Ok(trimmed.to_string())
}

/// Same as [`max_length`] for optional fields; blank values become `None`.
pub fn optional_max_length(
    value: Option<&str>,
    field: &'static str,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => max_length(v, field, max).map(Some),
        None => Ok(None),
    }
}
