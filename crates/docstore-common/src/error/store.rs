//! Store error types.
//!
//! Validation and session-state errors are raised before any I/O. Engine
//! errors carry the engine's native code so callers can branch on it.

use std::fmt;
use thiserror::Error;

use crate::constants::{ER_DUP_ENTRY, ER_NO_SUCH_TABLE};

/// Error kinds for exhaustive, programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An argument failed validation.
    Validation,
    /// No open session, or a second `init` on an open session.
    SessionState,
    /// Network, protocol or constraint failure reported by the engine.
    Engine,
    /// The query lexer met a character it has no rule for.
    Lexical,
    /// A document could not be encoded or decoded.
    Serialization,
    /// Connection configuration is incomplete or malformed.
    InvalidConfig,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::SessionState => write!(f, "session_state"),
            ErrorKind::Engine => write!(f, "engine"),
            ErrorKind::Lexical => write!(f, "lexical"),
            ErrorKind::Serialization => write!(f, "serialization"),
            ErrorKind::InvalidConfig => write!(f, "invalid_config"),
        }
    }
}

/// The main error type for docstore.
///
/// # Example
///
/// ```rust
/// use docstore_common::error::{ErrorKind, StoreError};
///
/// let err = StoreError::invalid_argument("table");
/// assert_eq!(err.kind(), ErrorKind::Validation);
/// assert_eq!(err.to_string(), "please provide valid table");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An argument failed validation.
    #[error("{reason}")]
    Validation {
        /// Name of the failing argument.
        field: String,
        /// Human-readable rule that was violated.
        reason: String,
    },

    /// The session is not in a state that allows the operation.
    #[error("{reason}")]
    SessionState {
        /// Why the operation was refused.
        reason: String,
    },

    /// Error reported by the engine or the connection to it.
    #[error("{message}")]
    Engine {
        /// Native engine error code, when the engine produced one.
        code: Option<u16>,
        /// SQLSTATE, when the engine produced one.
        state: Option<String>,
        /// Error text, possibly enhanced with field names.
        message: String,
    },

    /// The query lexer could not tokenize its input.
    #[error("Unexpected character '{character}' in query: {input}")]
    Lexical {
        /// Offending character.
        character: char,
        /// Entire input string.
        input: String,
    },

    /// A document could not be encoded or decoded.
    #[error("serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },

    /// Connection configuration is incomplete or malformed.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Offending configuration field.
        field: String,
        /// Error message.
        message: String,
    },
}

impl StoreError {
    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::SessionState { .. } => ErrorKind::SessionState,
            Self::Engine { .. } => ErrorKind::Engine,
            Self::Lexical { .. } => ErrorKind::Lexical,
            Self::Serialization { .. } => ErrorKind::Serialization,
            Self::InvalidConfig { .. } => ErrorKind::InvalidConfig,
        }
    }

    /// Returns the native engine code, if any.
    #[must_use]
    pub const fn engine_code(&self) -> Option<u16> {
        match self {
            Self::Engine { code, .. } => *code,
            _ => None,
        }
    }

    /// Returns true if the engine reported a missing table.
    #[must_use]
    pub const fn is_no_such_table(&self) -> bool {
        matches!(self.engine_code(), Some(ER_NO_SUCH_TABLE))
    }

    /// Returns true if the engine rejected a duplicate unique-key value.
    #[must_use]
    pub const fn is_duplicate_entry(&self) -> bool {
        matches!(self.engine_code(), Some(ER_DUP_ENTRY))
    }

    /// Creates a `please provide valid <field>` validation error.
    #[must_use]
    pub fn invalid_argument(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::Validation {
            reason: format!("please provide valid {field}"),
            field,
        }
    }

    /// Creates a validation error for an invalid filter key.
    #[must_use]
    pub fn invalid_field_name(key: &str) -> Self {
        Self::Validation {
            field: "queryObject".to_string(),
            reason: format!("Invalid filed name {key}"),
        }
    }

    /// Creates the error returned by operations issued before `init`.
    #[must_use]
    pub fn not_initialized(operation: &str) -> Self {
        Self::SessionState {
            reason: format!("Please call init before {operation}"),
        }
    }

    /// Creates the error returned by `init` on an open session.
    #[must_use]
    pub fn already_initialized() -> Self {
        Self::SessionState {
            reason: "one connection active, close before reinitializing".to_string(),
        }
    }

    /// Creates an engine error without a native code.
    #[must_use]
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            code: None,
            state: None,
            message: message.into(),
        }
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Replaces the message of an engine error, keeping code and state.
    ///
    /// Other kinds are returned unchanged.
    #[must_use]
    pub fn map_engine_message(self, f: impl FnOnce(String) -> String) -> Self {
        match self {
            Self::Engine {
                code,
                state,
                message,
            } => Self::Engine {
                code,
                state,
                message: f(message),
            },
            other => other,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
