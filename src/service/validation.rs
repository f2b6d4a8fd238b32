//! Field constraints shared by the repositories.

use crate::error::AppError;
use uuid::Uuid;

/// A required text field must not be blank. The value is passed through exactly as given.
pub fn required_text(field: &str, value: String) -> Result<String, AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(value)
}

/// Collapse repeated ids, keeping the first occurrence.
pub fn dedup_ids(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
