//! Internal helpers for record validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so every container enforces the same
//! invariants.

use chrono::{DateTime, SubsecRound, Utc};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Current time, truncated to milliseconds so it survives a round trip
/// through the database unchanged.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| EngineError::InvalidRecord(format!("invalid {label} id: {value}")))
}

pub(crate) fn parse_optional_uuid(value: Option<&str>, label: &str) -> ResultEngine<Option<Uuid>> {
    value.map(|value| parse_uuid(value, label)).transpose()
}

/// Trim a required text field, rejecting empty values.
pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Normalize a display name (NFKC, trimmed), so that full-width and
/// half-width spellings of the same name compare equal.
pub(crate) fn normalize_display_name(value: &str, label: &str) -> ResultEngine<String> {
    let normalized: String = value.nfkc().collect();
    normalize_required_text(&normalized, label)
}

/// Lookup form of a display name, matching what [`normalize_display_name`]
/// stores.
pub(crate) fn display_key(value: &str) -> String {
    let normalized: String = value.nfkc().collect();
    normalized.trim().to_string()
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Amounts are never negative; the sign comes from the transaction kind.
pub(crate) fn ensure_non_negative(amount: i64, label: &str) -> ResultEngine<()> {
    if amount < 0 {
        return Err(EngineError::Validation(format!("{label} must be >= 0")));
    }
    Ok(())
}
