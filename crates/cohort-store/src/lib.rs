//! Slot-arena agent storage for Cohort groups.
//!
//! Agents live in per-name [`Collection`]s inside one [`AgentStore`].
//! Group views never own agents; they hold ids and resolve them here.
//!
//! # Architecture
//!
//! ```text
//! StoreHandle (Arc<Mutex<..>>, cloned into every group view)
//! └── AgentStore
//!     ├── StoreConfig (worker partitions, initial capacity)
//!     └── IndexMap<GroupName, Collection>
//!         └── Slot[] (Live | Tombstone | CheckedOut), indexed by AgentId
//! ```
//!
//! # Slot lifecycle
//!
//! - **Reserve:** the collection grows by one tombstone; the new id is the
//!   previous length.
//! - **Install:** a tombstone becomes live once the agent is initialised.
//! - **Tombstone:** deletion leaves the position in place, so ids held by
//!   other views never shift.
//! - **Check out / in:** parallel dispatch moves agents out for the
//!   duration of one phase and puts them back afterwards.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod collection;
pub mod config;
pub mod error;
pub mod handle;
pub mod store;

// Public re-exports for the primary API surface.
pub use collection::{Collection, Slot};
pub use config::StoreConfig;
pub use error::StoreError;
pub use handle::StoreHandle;
pub use store::AgentStore;
