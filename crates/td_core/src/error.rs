//! Error types for the tower defense core.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all core errors.
///
/// Reaching the end of the path and running out of spawns are not errors;
/// they are reported as `None` by the operations that produce them.
#[derive(Debug, Error)]
pub enum GameError {
    /// Configuration violated one or more constraints.
    ///
    /// All violations found are reported together; nothing is applied.
    #[error("Invalid {context} configuration: {}", .errors.join("; "))]
    Config {
        /// Which configuration was being loaded.
        context: String,
        /// Every violation found.
        errors: Vec<String>,
    },

    /// Configuration text could not be parsed.
    #[error("Failed to parse {context} configuration: {source}")]
    ConfigParse {
        /// Which configuration was being parsed.
        context: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// An argument was rejected by the call that received it.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Cell coordinates outside the grid.
    #[error("Cell ({x}, {y}) is outside the map")]
    OutOfBounds {
        /// Column.
        x: i32,
        /// Row.
        y: i32,
    },

    /// Operation not allowed in the current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Serialized data does not describe a valid model.
    #[error("Invalid data: {0}")]
    Data(String),
}

impl GameError {
    /// Build a [`GameError::Config`] from a context name and violations.
    pub fn config(context: impl Into<String>, errors: Vec<String>) -> Self {
        Self::Config {
            context: context.into(),
            errors,
        }
    }
}
