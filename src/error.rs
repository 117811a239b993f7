//! Error types for stint.

use std::io;
use thiserror::Error;

/// Result type alias for stint operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in stint operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before any state was touched.
    #[error("Validation error: {0}")]
    Validation(String),

    /// SQLite failure.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Store failure that is not a SQLite error (corrupt row, poisoned lock).
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Filesystem I/O error.
    #[error("Storage error: {0}")]
    Storage(#[from] io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Event not valid in the current engine state.
    #[error("Invalid event: {event} while {state}")]
    Protocol {
        /// Event that was rejected.
        event: &'static str,
        /// Engine state at the time.
        state: &'static str,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this error came from the backing store.
    #[must_use]
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Persistence(_) | Self::Storage(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_not_persistence() {
        assert!(!Error::validation("empty category").is_persistence());
    }

    #[test]
    fn store_errors_are_persistence() {
        assert!(Error::Persistence("lock poisoned".into()).is_persistence());
        assert!(Error::Storage(io::Error::other("disk full")).is_persistence());
        assert!(Error::Database(rusqlite::Error::QueryReturnedNoRows).is_persistence());
    }

    #[test]
    fn protocol_message_names_event_and_state() {
        let err = Error::Protocol {
            event: "resume",
            state: "idle",
        };
        assert_eq!(err.to_string(), "Invalid event: resume while idle");
    }
}
