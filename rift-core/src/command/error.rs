//! Errors raised while running a command.
use thiserror::Error;

/// Why a command did not run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The sender lacks the command's permission.
    #[error("permission denied")]
    PermissionDenied,
    /// The command failed with a message for the sender.
    #[error("{0}")]
    CommandFailed(String),
}
