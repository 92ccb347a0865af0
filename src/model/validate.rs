use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;
use thiserror::Error;

use super::contact::{ContactData, ContactDraft, BIRTHDAY_FORMAT};

// Starts with uppercase letters; then letters/digits in groups separated by
// at most one hyphen or space; never a leading or trailing hyphen.
static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]+([ -]?[A-Za-z0-9]+)*$").expect("valid name regex"));

// The strict canonical phone rule. The looser legacy shape with parentheses,
// an optional leading 8 and 3-3-2-2 separator groups is deliberately rejected.
static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+7\d{10}$").expect("valid phone regex"));

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(
        "Invalid {field} '{value}': must start with an uppercase letter, may contain \
         letters, digits and single internal hyphens or spaces, and must not start \
         or end with a hyphen"
    )]
    InvalidName { field: &'static str, value: String },

    #[error("Invalid phone number '{0}': must be +7 followed by exactly 10 digits")]
    InvalidPhone(String),

    #[error("Invalid e-mail '{0}': must be of the local@domain.tld form")]
    InvalidEmail(String),

    #[error("Invalid birthday '{0}': must be a DD-MM-YYYY date strictly before today")]
    InvalidBirthday(String),
}

pub fn validate_name(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if !NAME_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidName {
            field,
            value: value.to_string(),
        });
    }

    Ok(trimmed.to_string())
}

pub fn validate_phone(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if !PHONE_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidPhone(value.to_string()));
    }

    Ok(trimmed.to_string())
}

pub fn validate_email(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidEmail(value.to_string()));
    }

    Ok(trimmed.to_string())
}

/// Birthdays must parse day-month-year and lie strictly before `today`
pub fn validate_birthday_at(value: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let trimmed = value.trim();

    let birthday = NaiveDate::parse_from_str(trimmed, BIRTHDAY_FORMAT)
        .map_err(|_| ValidationError::InvalidBirthday(value.to_string()))?;

    if birthday >= today {
        return Err(ValidationError::InvalidBirthday(value.to_string()));
    }

    Ok(birthday)
}

pub fn validate_birthday(value: &str) -> Result<NaiveDate, ValidationError> {
    validate_birthday_at(value, Local::now().date_naive())
}

/// Validates a whole submission. Checks run in field order and the first
/// failure blocks the submission, nothing is partially accepted.
pub fn validate_draft(draft: &ContactDraft) -> Result<ContactData, ValidationError> {
    let last_name = validate_name("last name", &draft.last_name)?;
    let first_name = validate_name("first name", &draft.first_name)?;
    let patronymic_name = validate_name("patronymic", &draft.patronymic_name)?;

    // Phones arrive comma-separated; empty segments are dropped, the rest
    // must each pass the strict rule. At least one phone is required.
    let raw_phones: Vec<&str> = draft
        .phones
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect();

    if raw_phones.is_empty() {
        return Err(ValidationError::InvalidPhone(draft.phones.clone()));
    }

    let mut phones = Vec::with_capacity(raw_phones.len());
    for raw_phone in raw_phones {
        phones.push(validate_phone(raw_phone)?);
    }

    let email = validate_email(&draft.email)?;
    let birthday = validate_birthday(&draft.birthday)?;

    Ok(ContactData {
        last_name,
        first_name,
        patronymic_name,
        phones,
        email,
        birthday,
    })
}
