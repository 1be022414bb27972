//! Test utilities and mock agents for Cohort development.
//!
//! Provides a shared [`Journal`] that mock agents append to, so tests can
//! assert on call order across a whole dispatch, and [`AgentClass`]
//! constructors for the fixtures in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::{Arc, Mutex, MutexGuard};

use cohort_core::{AgentAddress, AgentClass, RoundId};

pub use fixtures::{CancellingAgent, FailingAgent, NullAgent, RecordingAgent};

/// One observable agent call.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// `execute` was entered.
    Execute {
        address: AgentAddress,
        command: String,
    },
    /// `receive` was entered.
    Receive {
        to: AgentAddress,
        from: AgentAddress,
        topic: String,
    },
    /// The round hook was entered.
    Advance { address: AgentAddress, round: RoundId },
}

/// Shared, append-only event log.
///
/// Clones share one log. Safe to use from the parallel dispatch threads.
#[derive(Clone, Debug, Default)]
pub struct Journal {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<Event>> {
        // A panicking test thread should not hide the events it logged.
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record(&self, event: Event) {
        self.guard().push(event);
    }

    /// Snapshot of every event so far.
    pub fn events(&self) -> Vec<Event> {
        self.guard().clone()
    }

    pub fn clear(&self) {
        self.guard().clear();
    }

    /// Addresses whose `execute` ran, in call order.
    pub fn executed(&self) -> Vec<AgentAddress> {
        self.guard()
            .iter()
            .filter_map(|e| match e {
                Event::Execute { address, .. } => Some(address.clone()),
                _ => None,
            })
            .collect()
    }

    /// Addresses whose round hook ran, in call order.
    pub fn advanced(&self) -> Vec<AgentAddress> {
        self.guard()
            .iter()
            .filter_map(|e| match e {
                Event::Advance { address, .. } => Some(address.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of messages delivered to `address`.
    pub fn received_by(&self, address: &AgentAddress) -> usize {
        self.guard()
            .iter()
            .filter(|e| matches!(e, Event::Receive { to, .. } if to == address))
            .count()
    }

    /// Whether every `Execute` event precedes every `Receive` event.
    ///
    /// Holds for a journal covering exactly one dispatch iff delivery
    /// waited for the whole compute phase.
    pub fn compute_precedes_delivery(&self) -> bool {
        let events = self.guard();
        let last_execute = events
            .iter()
            .rposition(|e| matches!(e, Event::Execute { .. }));
        let first_receive = events
            .iter()
            .position(|e| matches!(e, Event::Receive { .. }));
        match (last_execute, first_receive) {
            (Some(exec), Some(recv)) => exec < recv,
            _ => true,
        }
    }
}

/// Class whose agents do nothing and have no round hook.
pub fn null_class<I, S>(kind: &str, commands: I) -> AgentClass
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    AgentClass::new(kind, commands, |_| Box::new(NullAgent))
}

/// Class of [`RecordingAgent`]s logging to `journal`.
pub fn recording_class<I, S>(kind: &str, commands: I, journal: &Journal) -> AgentClass
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let journal = journal.clone();
    AgentClass::new(kind, commands, move |spawn| {
        Box::new(RecordingAgent::new(spawn.address(), journal.clone()))
    })
}

/// Class of [`FailingAgent`]s that succeed `succeed_count` calls each.
pub fn failing_class<I, S>(
    kind: &str,
    commands: I,
    journal: &Journal,
    succeed_count: usize,
) -> AgentClass
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let journal = journal.clone();
    AgentClass::new(kind, commands, move |spawn| {
        Box::new(FailingAgent::new(
            spawn.address(),
            journal.clone(),
            succeed_count,
        ))
    })
}

/// Class of [`CancellingAgent`]s.
pub fn cancelling_class<I, S>(kind: &str, commands: I, journal: &Journal) -> AgentClass
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let journal = journal.clone();
    AgentClass::new(kind, commands, move |spawn| {
        Box::new(CancellingAgent::new(spawn.address(), journal.clone()))
    })
}
