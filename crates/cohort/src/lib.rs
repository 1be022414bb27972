//! Cohort: group proxies for bulk-synchronous agent-based simulations.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Cohort sub-crates. For most users, adding `cohort` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use cohort::prelude::*;
//!
//! // An agent that answers every command with its own wealth.
//! struct Saver {
//!     wealth: f64,
//! }
//!
//! impl Agent for Saver {
//!     fn init(&mut self, params: &Params) -> Result<(), AgentError> {
//!         self.wealth = params.get("wealth").and_then(Value::as_f64).unwrap_or(0.0);
//!         Ok(())
//!     }
//!
//!     fn execute(
//!         &mut self,
//!         _ctx: &mut CommandContext<'_>,
//!         _command: &str,
//!         _args: &[Value],
//!     ) -> Result<Value, AgentError> {
//!         Ok(Value::Float(self.wealth))
//!     }
//!
//!     fn receive(&mut self, _message: Message) -> Result<(), AgentError> {
//!         Ok(())
//!     }
//! }
//!
//! let store = StoreHandle::new(StoreConfig::default()).unwrap();
//! let class = AgentClass::new("saver", ["report"], |_| Box::new(Saver { wealth: 0.0 }));
//! let mut savers = Group::new(&store, "saver", class, GroupConfig::default()).unwrap();
//!
//! let mut params = Params::new();
//! params.insert("wealth".into(), Value::Float(3.0));
//! savers.append_many(2, &params).unwrap();
//! savers.delete(AgentId(0)).unwrap();
//! assert_eq!(savers.append(&Params::new()).unwrap(), AgentId(0));
//!
//! let reports = savers.dispatch("report", &[]).unwrap();
//! assert_eq!(reports, vec![Value::Float(0.0), Value::Float(3.0)]);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `cohort-core` | IDs, values, capabilities, messages, the `Agent` trait |
//! | [`store`] | `cohort-store` | Slot-arena agent storage and message routing |
//! | [`engine`] | `cohort-engine` | `Group`, dispatch, identities, rounds, logging |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`cohort-core`).
///
/// Contains the [`types::Agent`] trait, [`types::AgentClass`] descriptors,
/// dynamically-typed [`types::Value`]s and capability sets.
pub use cohort_core as types;

/// Agent storage shared by every group view (`cohort-store`).
pub use cohort_store as store;

/// Group proxies and round advancement (`cohort-engine`).
///
/// [`engine::Group`] is the main entry point.
pub use cohort_engine as engine;

/// Common imports for typical Cohort usage.
///
/// ```rust
/// use cohort::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use cohort_core::{
        Agent, AgentAddress, AgentClass, AgentId, CapabilitySet, CommandContext, GroupName,
        Message, Params, RoundHook, RoundId, Spawn, Value,
    };

    // Errors
    pub use cohort_core::AgentError;
    pub use cohort_engine::GroupError;
    pub use cohort_store::StoreError;

    // Storage
    pub use cohort_store::{StoreConfig, StoreHandle};

    // Engine
    pub use cohort_engine::{
        CancelToken, DispatchMode, Group, GroupConfig, LogRequest, RoundReport,
    };
}
