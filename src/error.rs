//! Error types for callback processing.
//!
//! There is no recovery path: every error propagates to the embedding
//! runtime's own top-level handling. Processing is fail-fast per event.

use thiserror::Error;

/// Errors that can occur while handling a task event.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// Filesystem error creating a directory or appending a record.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A module argument the extraction rule requires was absent.
    #[error("action `{action}` is missing argument `{key}`")]
    MissingArg { action: String, key: String },

    /// A module argument did not have the expected shape.
    #[error("unexpected type for `{key}` in action `{action}`")]
    UnexpectedType { action: String, key: String },

    /// An `invocation` record without a `module_args` mapping.
    #[error("invocation for action `{0}` has no module_args mapping")]
    MalformedInvocation(String),

    /// A payload could not be serialized for the record text.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CallbackError {
    pub(crate) fn missing_arg(action: &str, key: &str) -> Self {
        CallbackError::MissingArg {
            action: action.to_string(),
            key: key.to_string(),
        }
    }

    pub(crate) fn unexpected_type(action: &str, key: &str) -> Self {
        CallbackError::UnexpectedType {
            action: action.to_string(),
            key: key.to_string(),
        }
    }
}
