//! Error types for git-dispatch.
//!
//! This module defines [`DispatchError`], the error type used throughout the
//! crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Resolution failures (`NotFound`, `Ambiguous`) are fatal: the shim never
//!   guesses which command was meant
//! - Redirect aborts are not errors; see [`crate::redirect::AbortReason`]
//! - Use `anyhow::Error` (via `DispatchError::Other`) for unexpected errors

use thiserror::Error;

/// Core error type for dispatch operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No known command matches the command token.
    #[error("'{token}' is not a known command")]
    NotFound { token: String },

    /// The command token is a prefix of several commands and none exactly.
    #[error("'{token}' is ambiguous; it could be: {}", candidates.join(", "))]
    Ambiguous {
        token: String,
        candidates: Vec<String>,
    },

    /// A backend query exited unsuccessfully or could not be started.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// Process replacement could not start the target.
    #[error("failed to exec {program}: {source}")]
    ExecFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
