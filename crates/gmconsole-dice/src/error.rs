//! Dice error types.

use gmconsole_core::error::DomainError;
use thiserror::Error;

/// Errors raised while parsing dice expressions or talking to a remote
/// randomness backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    /// The expression string is empty.
    #[error("empty dice expression")]
    Empty,

    /// The expression does not match `<count>d<size>[+/-<bonus>]`.
    #[error("invalid dice format: {0}")]
    InvalidFormat(String),

    /// Dice count outside `1..=MAX_DICE`.
    #[error("dice count must be between 1 and {max}, got {got}")]
    InvalidDiceCount {
        /// Upper bound.
        max: u32,
        /// Parsed count.
        got: u32,
    },

    /// Die size outside `1..=MAX_SIDES`.
    #[error("die size must be between 1 and {max}, got {got}")]
    InvalidDieSize {
        /// Upper bound.
        max: u32,
        /// Parsed size.
        got: u32,
    },

    /// The remote backend could not be reached or answered with an error.
    #[error("randomness backend error: {0}")]
    Backend(String),
}

impl From<DiceError> for DomainError {
    fn from(err: DiceError) -> Self {
        match err {
            DiceError::Backend(msg) => Self::Infrastructure(msg),
            other => Self::InvalidDice(other.to_string()),
        }
    }
}
