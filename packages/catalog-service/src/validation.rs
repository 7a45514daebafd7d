//! Field limits for request payloads
//!
//! Lengths are counted in characters, after trimming where the field is
//! stored trimmed.

use crate::error::{CatalogError, Result};

pub const MAX_COMPONENT_LEN: usize = 128;
pub const MAX_DESCRIPTION_LEN: usize = 1024;
pub const MAX_COLUMN_NAME_LEN: usize = 128;
pub const MAX_DATA_TYPE_LEN: usize = 64;
pub const MAX_COLUMN_DESCRIPTION_LEN: usize = 512;
pub const MAX_FQN_LEN: usize = 512;

/// `value` must be 1..=`max` characters long
pub fn require_length(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len == 0 {
        return Err(CatalogError::validation(format!(
            "Field '{}' must not be empty.",
            field
        )));
    }
    check_max_length(field, value, max)
}

/// `value` must be at most `max` characters long
pub fn check_max_length(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(CatalogError::validation(format!(
            "Field '{}' is too long ({} characters, at most {} allowed).",
            field, len, max
        )));
    }
    Ok(())
}

pub fn check_optional_length(field: &str, value: Option<&str>, max: usize) -> Result<()> {
    match value {
        Some(value) => check_max_length(field, value, max),
        None => Ok(()),
    }
}

/// FQN given to the lineage operations
pub fn check_fqn_argument(field: &str, fqn: &str) -> Result<()> {
    require_length(field, fqn, MAX_FQN_LEN)
}
