//! Error types raised by agents.
//!
//! [`AgentError`] is what agent code returns. The store and engine crates
//! wrap it with location context (`StoreError`, `GroupError`).

use std::error::Error as StdError;

use thiserror::Error;

/// Errors returned by [`Agent`](crate::Agent) and
/// [`RoundHook`](crate::RoundHook) implementations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The agent does not implement the command it was sent.
    ///
    /// Groups check commands against their capability set before
    /// dispatching, so this indicates a class that declared a command it
    /// does not handle.
    #[error("command '{command}' is not implemented")]
    UnknownCommand {
        /// The command that was not recognised.
        command: String,
    },
    /// An argument had the wrong arity or type.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Human-readable description of what's wrong.
        reason: String,
    },
    /// The agent cannot accept a delivered message.
    #[error("message rejected: {reason}")]
    MessageRejected {
        /// Why the message was refused.
        reason: String,
    },
    /// Cooperative stop request raised from inside agent code.
    ///
    /// During round advancement this halts the sweep without being
    /// reported as a failure.
    #[error("cancelled")]
    Cancelled,
    /// The agent's own logic failed.
    #[error("execution failed: {reason}")]
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// An arbitrary error raised by agent code.
    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync + 'static>),
}

impl AgentError {
    /// Shorthand for [`AgentError::ExecutionFailed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`AgentError::InvalidArgument`].
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`AgentError::UnknownCommand`].
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    /// Whether this error is a cooperative cancellation request.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_reason() {
        let e = AgentError::failed("out of stock");
        assert_eq!(e.to_string(), "execution failed: out of stock");
    }

    #[test]
    fn boxed_errors_are_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let e = AgentError::from(Box::new(io) as Box<dyn StdError + Send + Sync>);
        assert_eq!(e.to_string(), "disk gone");
        assert!(!e.is_cancellation());
    }

    #[test]
    fn cancelled_is_cancellation() {
        assert!(AgentError::Cancelled.is_cancellation());
    }
}
