//! Core types and traits for the Cohort agent-group framework.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! abstractions shared by the store and engine crates: identifiers,
//! dynamically-typed values, capability sets, messages, the [`Agent`]
//! trait and the [`AgentClass`] descriptor, and the agent error type.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod agent;
pub mod capability;
pub mod error;
pub mod id;
pub mod message;
pub mod value;

pub use agent::{
    is_logging_command, Agent, AgentClass, CommandContext, RoundHook, Spawn, AGG_LOG_COMMAND,
    LOG_LENGTH_PREFIX, PANEL_LOG_COMMAND,
};
pub use capability::{is_forwardable, CapabilitySet, INIT_COMMAND};
pub use error::AgentError;
pub use id::{AgentAddress, AgentId, GroupName, RoundId};
pub use message::{Message, Outbox};
pub use value::{Params, Value};
