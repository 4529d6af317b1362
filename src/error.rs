//! Error taxonomy for sync procedures
//!
//! Every way a sync can stop early maps onto one of these variants, and each
//! variant maps onto a process exit code.

use std::path::PathBuf;
use thiserror::Error;

use crate::error_handling::FailureReason;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Cannot continue: {0}")]
    PreconditionUnmet(String),

    #[error("Aborted by user during {stage}")]
    UserAborted { stage: &'static str },

    #[error("git {operation} failed ({reason}): {}", .stderr.trim())]
    OperationFailed {
        operation: String,
        reason: FailureReason,
        stderr: String,
    },

    #[error("{action} was not confirmed; nothing was changed")]
    DestructiveConfirmationDenied { action: &'static str },

    #[error("Git is not installed or not available in PATH. Please install git and try again.")]
    GitUnavailable,

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Build an `OperationFailed` from git's stderr, classifying the reason.
    #[must_use]
    pub fn operation_failed(operation: impl Into<String>, stderr: impl Into<String>) -> Self {
        let stderr = stderr.into();
        Self::OperationFailed {
            operation: operation.into(),
            reason: FailureReason::classify(&stderr),
            stderr,
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Process exit code for this failure. `2` is left to clap for usage
    /// errors, so a declined prompt is distinguishable from a bad flag.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::UserAborted { .. } | Self::DestructiveConfirmationDenied { .. } => 4,
            Self::PreconditionUnmet(_) => 3,
            Self::OperationFailed { .. }
            | Self::GitUnavailable
            | Self::Io { .. }
            | Self::Config { .. } => 1,
        }
    }

    /// True when the user chose to stop rather than something breaking
    #[must_use]
    pub const fn is_user_choice(&self) -> bool {
        matches!(
            self,
            Self::UserAborted { .. } | Self::DestructiveConfirmationDenied { .. }
        )
    }
}
