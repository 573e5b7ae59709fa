//! Error types for patch contexts and baselines

use std::io;
use thiserror::Error;

use crate::entity::EntityKind;

/// Result type alias for patch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for patch operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while writing a patch or reading a baseline
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A state or slot mutation that the allocator refuses
    #[error("Illegal mutation: {0}")]
    IllegalMutation(String),

    /// Index outside of the dialect's table bounds
    #[error("{kind} index {index} is out of bounds (count {count})")]
    IndexOutOfBounds {
        /// Kind of table that was indexed
        kind: EntityKind,
        /// Offending index
        index: i32,
        /// Table size
        count: i32,
    },

    /// Value rejected by the dialect
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation not available at the dialect's feature level
    #[error("Unsupported by {dialect}: {operation}")]
    Unsupported {
        /// Dialect name
        dialect: String,
        /// The unsupported operation
        operation: String,
    },

    /// Malformed or inconsistent baseline definition
    #[error("Baseline error: {0}")]
    Baseline(String),
}

impl Error {
    /// Create a new IllegalMutation error
    pub fn illegal_mutation<S: Into<String>>(msg: S) -> Self {
        Error::IllegalMutation(msg.into())
    }

    /// Create a new InvalidArgument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Create a new Baseline error
    pub fn baseline<S: Into<String>>(msg: S) -> Self {
        Error::Baseline(msg.into())
    }

    /// Create a new Unsupported error
    pub fn unsupported<D: Into<String>, S: Into<String>>(dialect: D, operation: S) -> Self {
        Error::Unsupported {
            dialect: dialect.into(),
            operation: operation.into(),
        }
    }

    /// Check if the driver can recover by choosing different parameters
    ///
    /// Bounds and argument errors point at a bad request; illegal mutations
    /// and baseline errors mean the compilation cannot continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::IndexOutOfBounds { .. } | Error::InvalidArgument(_) | Error::Unsupported { .. }
        )
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Baseline(format!("JSON: {err}"))
    }
}

#[cfg(feature = "yaml")]
impl From<serde_yaml_ng::Error> for Error {
    fn from(err: serde_yaml_ng::Error) -> Self {
        Error::Baseline(format!("YAML: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(Error::invalid_argument("too long").is_recoverable());
        assert!(
            Error::IndexOutOfBounds {
                kind: EntityKind::State,
                index: 5000,
                count: 1089,
            }
            .is_recoverable()
        );
        assert!(!Error::illegal_mutation("state 0 is protected").is_recoverable());
        assert!(!Error::baseline("missing states").is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = Error::IndexOutOfBounds {
            kind: EntityKind::Thing,
            index: 200,
            count: 137,
        };
        assert_eq!(err.to_string(), "Thing index 200 is out of bounds (count 137)");
    }
}
