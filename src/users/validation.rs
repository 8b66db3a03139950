//! Field rules for user records: trimming, defaults, ranges and required fields.
//!
//! Every rule is checked and all failures are reported together.

use super::error::{FieldError, UserError};
use super::model::{Address, AddressInput, DEFAULT_AGE, DEFAULT_AVATAR, DEFAULT_COUNTRY, NewUser, User};
use crate::types::DocumentId;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 50;
pub const AGE_MIN: i64 = 18;
pub const AGE_MAX: i64 = 120;
pub const STREET_MAX: usize = 100;
pub const CITY_MAX: usize = 50;
pub const STATE_MAX: usize = 50;

/// Trimmed value, or `None` when absent or blank.
fn clean(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Lowercased, trimmed email. No format check beyond non-empty.
#[must_use]
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// `[0-9]` rather than `\d`: only ASCII digits count
static ZIP_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[0-9]{5}(-[0-9]{4})?$").ok());

/// `12345` or `12345-6789`.
#[must_use]
pub fn is_valid_zip(zip: &str) -> bool {
    ZIP_RE.as_ref().is_some_and(|re| re.is_match(zip))
}

fn check_max(errors: &mut Vec<FieldError>, field: &str, label: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.push(FieldError::new(field, format!("{label} cannot exceed {max} characters")));
    }
}

fn address(input: Option<AddressInput>, errors: &mut Vec<FieldError>) -> Address {
    let input = input.unwrap_or_default();
    let street = clean(input.street);
    let city = clean(input.city);
    let state = clean(input.state);
    let zip_code = clean(input.zip_code);

    match &street {
        None => errors.push(FieldError::new("address.street", "Please provide street address")),
        Some(s) => check_max(errors, "address.street", "Street", s, STREET_MAX),
    }
    match &city {
        None => errors.push(FieldError::new("address.city", "Please provide city")),
        Some(c) => check_max(errors, "address.city", "City", c, CITY_MAX),
    }
    if let Some(s) = &state {
        check_max(errors, "address.state", "State", s, STATE_MAX);
    }
    if let Some(z) = &zip_code
        && !is_valid_zip(z)
    {
        errors.push(FieldError::new("address.zipCode", "Please provide a valid zip code"));
    }

    Address {
        street: street.unwrap_or_default(),
        city: city.unwrap_or_default(),
        state,
        country: clean(input.country).unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        zip_code,
    }
}

/// Validates `input` and builds the record it describes.
///
/// # Errors
/// `UserError::Validation` listing every failing field.
pub fn build_user(
    input: NewUser,
    id: DocumentId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Result<User, UserError> {
    let mut errors = Vec::new();

    let name = clean(input.name);
    match &name {
        None => errors.push(FieldError::new("name", "Please provide a name")),
        Some(n) if n.chars().count() < NAME_MIN => {
            errors.push(FieldError::new("name", format!("Name must be at least {NAME_MIN} characters")));
        }
        Some(n) => check_max(&mut errors, "name", "Name", n, NAME_MAX),
    }

    let email = input.email.as_deref().map(normalize_email).filter(|e| !e.is_empty());
    if email.is_none() {
        errors.push(FieldError::new("email", "Please provide an email"));
    }

    let age = input.age.unwrap_or(i64::from(DEFAULT_AGE));
    if age < AGE_MIN {
        errors.push(FieldError::new("age", format!("Age must be at least {AGE_MIN}")));
    } else if age > AGE_MAX {
        errors.push(FieldError::new("age", format!("Age must be less than {AGE_MAX}")));
    }

    let address = address(input.address, &mut errors);

    if !errors.is_empty() {
        return Err(UserError::Validation(errors));
    }
    let age = i32::try_from(age).map_err(|_| UserError::validation("age", "Age is out of range"))?;
    Ok(User {
        id,
        name: name.unwrap_or_default(),
        email: email.unwrap_or_default(),
        age,
        address,
        phone: clean(input.phone),
        avatar: clean(input.avatar).unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
        status: input.status.unwrap_or_default(),
        role: input.role.unwrap_or_default(),
        created_at,
        updated_at,
    })
}
