//! Store-specific error types.

use cohort_core::{AgentAddress, AgentError, AgentId, GroupName};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A group name that has not been created in the store.
    #[error("unknown group '{group}'")]
    UnknownGroup {
        /// The unrecognised name.
        group: GroupName,
    },
    /// `new_group` was called for a name that already exists.
    #[error("group '{group}' already exists")]
    GroupExists {
        /// The duplicate name.
        group: GroupName,
    },
    /// An id beyond the end of the group's collection.
    #[error("agent {id} is out of range for group '{group}' (len {len})")]
    OutOfRange {
        /// The group addressed.
        group: GroupName,
        /// The requested slot.
        id: AgentId,
        /// Current collection length.
        len: usize,
    },
    /// Every id a collection can address has been minted.
    #[error("group '{group}' has no ids left")]
    Full {
        /// The full collection.
        group: GroupName,
    },
    /// The addressed slot holds a tombstone or is checked out.
    #[error("agent {address} is not live")]
    NotLive {
        /// The slot addressed.
        address: AgentAddress,
    },
    /// `install` targeted a slot that already holds a live agent.
    #[error("slot {address} is occupied")]
    Occupied {
        /// The slot addressed.
        address: AgentAddress,
    },
    /// A message could not be handed to its recipient.
    #[error("delivery from {from} to {to} failed")]
    Delivery {
        /// The sender.
        from: AgentAddress,
        /// The intended recipient.
        to: AgentAddress,
        /// Why delivery failed.
        #[source]
        source: Box<StoreError>,
    },
    /// The recipient refused a delivered message.
    #[error("agent {address} rejected a message")]
    Rejected {
        /// The recipient.
        address: AgentAddress,
        /// The recipient's error.
        #[source]
        source: AgentError,
    },
    /// Worker count outside `[1, StoreConfig::MAX_WORKERS]`.
    #[error("worker count {configured} is outside [1, 64]")]
    InvalidWorkerCount {
        /// The configured value.
        configured: usize,
    },
    /// A thread panicked while holding the store lock.
    #[error("agent store lock poisoned")]
    Poisoned,
}
