//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{ListingChanges, ListingDraft};

pub const MAX_TITLE_LEN: usize = 255;
pub const MAX_IMAGES_LEN: usize = 500;

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() < 3 {
        return Err("Username must be at least 3 characters long".to_string());
    }

    if username.len() > 32 {
        return Err("Username must be at most 32 characters long".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err("Username can only contain letters, numbers, and underscores".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate a new password and its confirmation
///
/// No complexity rules are enforced.
pub fn validate_password(password: &str, confirm_password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    if password != confirm_password {
        return Err("Passwords do not match".to_string());
    }

    Ok(())
}

/// PostgreSQL text columns cannot store NUL characters
fn reject_nul(value: &str, field: &str) -> Result<(), String> {
    if value.contains('\0') {
        return Err(format!("{} must not contain NUL characters", field));
    }
    Ok(())
}

fn required_text(value: &str, field: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} is required", field));
    }
    reject_nul(trimmed, field)?;
    Ok(trimmed.to_string())
}

fn validate_title(title: &str) -> Result<String, String> {
    let title = required_text(title, "Title")?;
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(format!(
            "Title must be at most {} characters long",
            MAX_TITLE_LEN
        ));
    }
    Ok(title)
}

/// Blank image references are stored as absent
fn normalize_images(images: Option<&str>) -> Result<Option<String>, String> {
    let Some(images) = images.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    reject_nul(images, "Images")?;
    if images.chars().count() > MAX_IMAGES_LEN {
        return Err(format!(
            "Images must be at most {} characters long",
            MAX_IMAGES_LEN
        ));
    }

    Ok(Some(images.to_string()))
}

/// Parse the optional characteristics field, which must be a JSON object
pub fn parse_characteristics(raw: Option<&str>) -> Result<Option<serde_json::Value>, String> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    // JSONB rejects the escaped form as well
    if raw.contains("\\u0000") {
        return Err("Characteristics must not contain NUL characters".to_string());
    }
    reject_nul(raw, "Characteristics")?;

    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value @ serde_json::Value::Object(_)) => Ok(Some(value)),
        Ok(_) => Err("Characteristics must be a JSON object".to_string()),
        Err(e) => Err(format!("Characteristics are not valid JSON: {}", e)),
    }
}

/// Validate the fields of a new listing
pub fn validate_listing(
    title: &str,
    description: &str,
    images: Option<&str>,
    characteristics: Option<&str>,
) -> Result<ListingDraft, String> {
    Ok(ListingDraft {
        title: validate_title(title)?,
        description: required_text(description, "Description")?,
        images: normalize_images(images)?,
        characteristics: parse_characteristics(characteristics)?,
    })
}

/// Validate the editable fields of an existing listing
pub fn validate_listing_changes(
    title: &str,
    description: &str,
    images: Option<&str>,
) -> Result<ListingChanges, String> {
    Ok(ListingChanges {
        title: validate_title(title)?,
        description: required_text(description, "Description")?,
        images: normalize_images(images)?,
    })
}
