//! Error types surfaced by [`Group`](crate::Group) operations.

use cohort_core::{AgentAddress, AgentError, GroupName, RoundId};
use cohort_store::StoreError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors returned from group construction, dispatch, identity management
/// and round advancement.
#[derive(Debug, Error)]
pub enum GroupError {
    /// The command is not in the group's capability set.
    #[error("command '{command}' is not supported by group '{group}'")]
    UnsupportedCommand {
        /// The rejected command.
        command: String,
        /// Names the group addresses, joined with `+`.
        group: String,
    },
    /// `append` or `delete` on a group that does not own its identities.
    ///
    /// Only the group returned by `Group::new` may create or destroy
    /// agents; selections and unions are dispatch-only views.
    #[error("{operation} is only valid on the owning single-name group (this view addresses {names} name(s))")]
    CompositeIdentity {
        /// The operation attempted.
        operation: &'static str,
        /// Number of names the view addresses.
        names: usize,
    },
    /// The constituent agent classes share no forwardable command.
    #[error("agent classes {kinds:?} have no command in common")]
    EmptyCapabilities {
        /// Kinds of the classes involved.
        kinds: Vec<String>,
    },
    /// `union_all` was given no groups.
    #[error("cannot form a union of zero groups")]
    EmptyUnion,
    /// `union` of groups that both address the same name.
    #[error("group '{name}' appears on both sides of a union")]
    OverlappingNames {
        /// The shared name.
        name: GroupName,
    },
    /// `union` of groups backed by different stores.
    #[error("cannot combine groups backed by different agent stores")]
    StoreMismatch,
    /// Parallel dispatch found the same agent selected twice.
    #[error("agent {address} is selected more than once")]
    DuplicateSelection {
        /// The repeated agent.
        address: AgentAddress,
    },
    /// An agent failed while running a command.
    #[error("agent {address} failed on '{command}'")]
    Agent {
        /// The failing agent.
        address: AgentAddress,
        /// The command it was running.
        command: String,
        /// The agent's error.
        #[source]
        source: AgentError,
    },
    /// An agent's round hook failed; the sweep was stopped.
    #[error("agent {address} failed to advance to round {round}")]
    RoundFailed {
        /// The failing agent.
        address: AgentAddress,
        /// The round being advanced.
        round: RoundId,
        /// The hook's error, preserved for the caller.
        #[source]
        source: AgentError,
    },
    /// A dispatch worker thread panicked.
    #[error("a dispatch worker panicked")]
    WorkerPanicked,
    /// The agent store rejected an operation.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The group configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GroupError {
    /// The underlying agent error, if the failure originated in agent code.
    pub fn agent_error(&self) -> Option<&AgentError> {
        match self {
            Self::Agent { source, .. } | Self::RoundFailed { source, .. } => Some(source),
            Self::Store(StoreError::Rejected { source, .. }) => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn round_failure_keeps_source() {
        let err = GroupError::RoundFailed {
            address: AgentAddress::new("firm", 2u32),
            round: RoundId(7),
            source: AgentError::failed("bankrupt"),
        };
        assert_eq!(err.to_string(), "agent firm[2] failed to advance to round 7");
        let source = err.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("execution failed: bankrupt"));
        assert!(err.agent_error().is_some());
    }

    #[test]
    fn overlap_names_the_shared_group() {
        let err = GroupError::OverlappingNames {
            name: GroupName::from("firm"),
        };
        assert_eq!(err.to_string(), "group 'firm' appears on both sides of a union");
    }

    #[test]
    fn store_errors_are_transparent() {
        let err = GroupError::from(StoreError::Poisoned);
        assert_eq!(err.to_string(), "agent store lock poisoned");
        assert!(err.agent_error().is_none());
    }
}
