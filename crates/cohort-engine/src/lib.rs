//! Group proxy for bulk-synchronous agent simulations.
//!
//! Provides [`Group`], a view over named agent collections in a shared
//! [`StoreHandle`](cohort_store::StoreHandle). A group forwards commands
//! to its selected agents in two phases (compute, then deliver messages),
//! recycles agent ids through a free list, composes heterogeneous groups
//! over their common commands, and advances agents through rounds with
//! defined cancellation and fault handling.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cancel;
pub mod config;
mod dispatch;
pub mod error;
pub mod group;
pub mod identity;
pub mod logging;
pub mod metrics;
pub mod round;

pub use cancel::CancelToken;
pub use config::{ConfigError, DispatchMode, GroupConfig};
pub use error::GroupError;
pub use group::{Group, Selection, BEGIN_OF_SIMULATION};
pub use identity::IdentityManager;
pub use logging::{Aggregate, AggregateRecord, Derived, LogRequest, PanelRecord};
pub use metrics::DispatchMetrics;
pub use round::RoundReport;
