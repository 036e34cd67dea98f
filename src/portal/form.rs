//! Form checks shared by the write paths.

use crate::error::{HerbTraceError, Result};

/// Longest free-text value accepted for a single form field.
pub const MAX_FIELD_LEN: usize = 1_000;
/// Largest file accepted for an image or PDF upload.
pub const MAX_UPLOAD_SIZE: usize = 10_000_000; // 10MB

/// Trimmed value of a required text field.
pub fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(HerbTraceError::InvalidInput(format!("{} is required", field)));
    }
    if trimmed.len() > MAX_FIELD_LEN {
        return Err(HerbTraceError::InvalidInput(format!(
            "{} exceeds {} characters",
            field, MAX_FIELD_LEN
        )));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(HerbTraceError::InvalidInput(format!(
            "{} contains control characters",
            field
        )));
    }
    Ok(trimmed.to_string())
}

/// Trimmed value of an optional text field, falling back when blank.
pub fn text_or(field: &str, value: &str, fallback: &str) -> Result<String> {
    if value.trim().is_empty() {
        Ok(fallback.to_string())
    } else {
        require_text(field, value)
    }
}

pub fn require_file(field: &str, bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Err(HerbTraceError::InvalidInput(format!("{} is required", field)));
    }
    if bytes.len() > MAX_UPLOAD_SIZE {
        return Err(HerbTraceError::InvalidInput(format!(
            "{} is larger than {} bytes",
            field, MAX_UPLOAD_SIZE
        )));
    }
    Ok(())
}
