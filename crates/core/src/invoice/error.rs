//! Invoice domain error types.

use thiserror::Error;

/// Errors raised while deriving the next invoice number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberingError {
    /// The latest stored number is not a decimal integer.
    #[error("stored invoice number {0:?} is not numeric")]
    Malformed(String),

    /// The latest stored number cannot be incremented.
    #[error("invoice number {0} cannot be incremented")]
    Overflow(u64),
}
