//! Failure classification used to pick the process exit code.
//!
//! Errors travel as [`anyhow::Error`]. At the points where a failure can be
//! classified, a [`Failure`] is attached as context; `main` downcasts to it.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Failure {
    /// Bad date range, malformed template, unreadable image or font.
    #[error("invalid input")]
    Input,
    /// Missing, rejected or under-privileged access token.
    #[error("authentication failed")]
    Auth,
    /// A commit or the push was rejected.
    #[error("execution incomplete")]
    Execution,
}

impl Failure {
    pub fn code(self) -> u8 {
        match self {
            Failure::Input => 2,
            Failure::Auth => 3,
            Failure::Execution => 4,
        }
    }
}

/// Exit code for an error returned from a command. Unclassified errors exit with 1.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<Failure>()
        .copied()
        .map(Failure::code)
        .unwrap_or(1)
}
