//! Morocco mobile number validation and normalization.
//!
//! Accepts mobile numbers starting with 06 or 07.
//! Domestic format: `0[67]XXXXXXXX` (10 digits).
//! International format: `+212[67]XXXXXXXX` (13 characters).

use std::sync::LazyLock;

use regex::Regex;

static CLEAN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-().]").expect("valid regex"));
static DOMESTIC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0[67][0-9]{8}$").expect("valid regex"));
static SHORT_FORMAT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[67][0-9]{8}$").expect("valid regex"));
static DIGITS_ONLY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("valid regex"));
static DISPLAY_GROUPS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})(\d{2})(\d{2})(\d{2})(\d{2})$").expect("valid regex"));

/// Why an input failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneErrorKind {
    Empty,
    InvalidLength,
    InvalidPrefix,
    InvalidFormat,
}

/// A validation failure with a user-facing message and optional details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneError {
    pub kind: PhoneErrorKind,
    pub message: &'static str,
    pub details: Option<&'static str>,
}

impl PhoneError {
    fn new(kind: PhoneErrorKind, message: &'static str, details: Option<&'static str>) -> Self {
        Self {
            kind,
            message,
            details,
        }
    }
}

/// Result of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneValidation {
    pub is_valid: bool,
    /// Canonical `+212XXXXXXXXX` form; empty when invalid.
    pub normalized: String,
    pub error: Option<PhoneError>,
}

/// Validates and normalizes a Moroccan phone number to international format
/// (`+212XXXXXXXXX`).
///
/// Deterministic and side-effect-free. Separators (spaces, hyphens,
/// parentheses, dots) are stripped before classification.
pub fn validate(input: &str) -> PhoneValidation {
    if input.is_empty() {
        return PhoneValidation {
            is_valid: false,
            normalized: String::new(),
            error: Some(PhoneError::new(
                PhoneErrorKind::Empty,
                "Phone number is required",
                None,
            )),
        };
    }

    let cleaned = CLEAN_REGEX.replace_all(input, "");

    let mut normalized = String::new();
    let mut error: Option<PhoneError> = None;

    if cleaned.starts_with('0') {
        // Domestic format with leading zero
        if cleaned.len() != 10 {
            error = Some(PhoneError::new(
                PhoneErrorKind::InvalidLength,
                "Invalid phone number length",
                Some("Morocco phone numbers should be 10 digits (e.g., 0612345678)"),
            ));
        } else if !DOMESTIC_REGEX.is_match(&cleaned) {
            error = Some(PhoneError::new(
                PhoneErrorKind::InvalidPrefix,
                "Invalid phone number prefix",
                Some("Morocco mobile numbers must start with 06 or 07"),
            ));
        } else {
            normalized = format!("+212{}", &cleaned[1..]);
        }
    } else if SHORT_FORMAT_REGEX.is_match(&cleaned) {
        // Entered without the leading zero: 9 digits starting with 6 or 7
        normalized = format!("+212{cleaned}");
    } else if DIGITS_ONLY_REGEX.is_match(&cleaned) {
        // All digits but wrong length or prefix
        if cleaned.len() < 9 {
            error = Some(PhoneError::new(
                PhoneErrorKind::InvalidLength,
                "Phone number too short",
                Some("Please enter at least 9 digits"),
            ));
        } else if cleaned.len() > 10 {
            error = Some(PhoneError::new(
                PhoneErrorKind::InvalidLength,
                "Phone number too long",
                Some("Morocco phone numbers have maximum 10 digits"),
            ));
        } else {
            error = Some(PhoneError::new(
                PhoneErrorKind::InvalidPrefix,
                "Invalid phone number prefix",
                Some("Morocco mobile numbers must start with 06 or 07"),
            ));
        }
    } else {
        error = Some(PhoneError::new(
            PhoneErrorKind::InvalidFormat,
            "Invalid phone number format",
            Some("Phone number should contain only digits, with optional +212 prefix"),
        ));
    }

    PhoneValidation {
        is_valid: !normalized.is_empty() && error.is_none(),
        normalized,
        error,
    }
}

/// Formats a phone number for display (`+212XXXXXXXXX` -> `0X XX XX XX XX`).
///
/// Inputs that do not reduce to a 10-digit local form are returned with only
/// the `+212` prefix swapped for `0`.
pub fn format_for_display(phone_number: &str) -> String {
    if phone_number.is_empty() {
        return String::new();
    }

    let cleaned = phone_number.replacen("+212", "0", 1);

    if let Some(caps) = DISPLAY_GROUPS_REGEX.captures(&cleaned) {
        return format!(
            "{} {} {} {} {}",
            &caps[1], &caps[2], &caps[3], &caps[4], &caps[5]
        );
    }

    cleaned
}

/// Bridge for `validator` derive: `#[validate(custom(function = "..."))]`.
pub fn validate_phone_field(value: &str) -> Result<(), validator::ValidationError> {
    let result = validate(value);
    if let Some(error) = result.error {
        let mut err = validator::ValidationError::new("phone_number");
        err.message = Some(error.details.unwrap_or(error.message).into());
        return Err(err);
    }
    Ok(())
}
