//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
///
/// Every error raised while interpreting an operator command is one of these.
/// None of them end the session: callers log and carry on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// No handler is registered under this command name.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The command received an unsupported number of arguments.
    #[error("command {command} expects {expected} argument(s), got {got}")]
    Arity {
        /// The command name.
        command: String,
        /// Human-readable description of the accepted argument count.
        expected: String,
        /// Number of arguments actually supplied.
        got: usize,
    },

    /// A numeric argument could not be parsed.
    #[error("invalid number: {0}")]
    InvalidNumber(String),

    /// An argument was present but malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No character, place, scene or object matches the given key or name.
    #[error("not found: {0}")]
    EntityNotFound(String),

    /// A dice expression could not be parsed.
    #[error("invalid dice expression: {0}")]
    InvalidDice(String),

    /// The command is well-formed but not allowed in the current state.
    #[error("validation error: {0}")]
    Validation(String),

    /// Content loading or another collaborator failed.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
