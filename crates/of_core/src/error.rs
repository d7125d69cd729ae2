//! Error types for the combat simulation.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Top-level error type for all combat core errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced unit does not exist.
    #[error("Unit not found: {0}")]
    UnitNotFound(u32),

    /// Referenced weapon does not exist.
    #[error("Weapon not found: {0}")]
    WeaponNotFound(String),

    /// A command was rejected without changing state.
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Loaded data failed validation. Identifies the offending record.
    #[error("Invalid data in record '{record}': {message}")]
    DataError {
        /// Identifier of the record that failed validation.
        record: String,
        /// What was wrong with it.
        message: String,
    },

    /// Data file parsing error.
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Invalid simulation state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

impl CoreError {
    /// Convenience constructor for load-time validation failures.
    #[must_use]
    pub fn data(record: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataError {
            record: record.into(),
            message: message.into(),
        }
    }
}
