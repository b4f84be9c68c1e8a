//! Organisation-scoped sequential invoice numbering.

use super::error::NumberingError;

/// Number given to an organisation's first invoice.
pub const FIRST_NUMBER: &str = "1";

/// Derives the next number from the organisation's most recently created one.
///
/// `None` means the organisation has no invoices yet.
///
/// # Errors
///
/// Returns `NumberingError::Malformed` if `latest` is not a non-negative
/// decimal integer, or `NumberingError::Overflow` at `u64::MAX`.
pub fn next_number(latest: Option<&str>) -> Result<String, NumberingError> {
    let Some(latest) = latest else {
        return Ok(FIRST_NUMBER.to_string());
    };

    let trimmed = latest.trim();
    let current: u64 = trimmed
        .parse()
        .map_err(|_| NumberingError::Malformed(latest.to_string()))?;

    current
        .checked_add(1)
        .map(|next| next.to_string())
        .ok_or(NumberingError::Overflow(current))
}
