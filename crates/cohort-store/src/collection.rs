//! Per-group slot arena.
//!
//! A [`Collection`] is an append-only vector of [`Slot`]s. Slots are never
//! compacted or reordered, so `AgentId(n)` always addresses index `n`.
//! Deleting an agent leaves a tombstone; reuse of the id is decided by the
//! owning group's free list, not here.

use std::fmt;

use cohort_core::{Agent, AgentAddress, AgentId, GroupName};

use crate::error::StoreError;

/// One position in a [`Collection`].
pub enum Slot {
    /// A live agent instance.
    Live(Box<dyn Agent>),
    /// A deleted or not-yet-installed agent.
    Tombstone,
    /// Temporarily moved out of the store for parallel execution.
    CheckedOut,
}

impl Slot {
    /// Whether the slot holds a live agent.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live(_) => f.write_str("Live"),
            Self::Tombstone => f.write_str("Tombstone"),
            Self::CheckedOut => f.write_str("CheckedOut"),
        }
    }
}

/// Ordered, indexed storage for one named group of agents.
#[derive(Debug)]
pub struct Collection {
    name: GroupName,
    /// All slots (live and dead), indexed by `AgentId`.
    slots: Vec<Slot>,
    /// Number of `Live` or `CheckedOut` slots.
    live: usize,
}

impl Collection {
    /// Create an empty collection.
    pub fn new(name: GroupName, capacity: usize) -> Self {
        Self {
            name,
            slots: Vec::with_capacity(capacity),
            live: 0,
        }
    }

    /// The group name this collection stores.
    pub fn name(&self) -> &GroupName {
        &self.name
    }

    /// Total slots (live + dead).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot has ever been allocated.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots holding an agent (including checked-out ones).
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Extend the collection by one tombstoned slot and return its id.
    ///
    /// The new id always equals the length before the call. Fails with
    /// [`StoreError::Full`] once every `u32` id has been minted.
    pub fn reserve_slot(&mut self) -> Result<AgentId, StoreError> {
        let id = slot_id(self.slots.len()).ok_or_else(|| StoreError::Full {
            group: self.name.clone(),
        })?;
        self.slots.push(Slot::Tombstone);
        Ok(id)
    }

    /// Whether `id` holds a live agent. Out-of-range ids are not live.
    pub fn is_live(&self, id: AgentId) -> bool {
        self.slots.get(id.index()).is_some_and(Slot::is_live)
    }

    /// Install `agent` into a tombstoned slot.
    pub fn install(&mut self, id: AgentId, agent: Box<dyn Agent>) -> Result<(), StoreError> {
        let address = self.address(id);
        let slot = self.slot_mut(id)?;
        if !matches!(slot, Slot::Tombstone) {
            return Err(StoreError::Occupied { address });
        }
        *slot = Slot::Live(agent);
        self.live += 1;
        Ok(())
    }

    /// Replace a live agent with a tombstone, returning the removed agent.
    pub fn tombstone(&mut self, id: AgentId) -> Result<Box<dyn Agent>, StoreError> {
        let address = self.address(id);
        let slot = self.slot_mut(id)?;
        match std::mem::replace(slot, Slot::Tombstone) {
            Slot::Live(agent) => {
                self.live -= 1;
                Ok(agent)
            }
            other => {
                *slot = other;
                Err(StoreError::NotLive { address })
            }
        }
    }

    /// Shared access to a live agent.
    pub fn get(&self, id: AgentId) -> Result<&dyn Agent, StoreError> {
        match self.slots.get(id.index()) {
            Some(Slot::Live(agent)) => Ok(&**agent),
            Some(_) => Err(StoreError::NotLive {
                address: self.address(id),
            }),
            None => Err(StoreError::OutOfRange {
                group: self.name.clone(),
                id,
                len: self.slots.len(),
            }),
        }
    }

    /// Mutable access to a live agent.
    pub fn get_mut(&mut self, id: AgentId) -> Result<&mut dyn Agent, StoreError> {
        let address = self.address(id);
        match self.slot_mut(id)? {
            Slot::Live(agent) => Ok(agent.as_mut()),
            _ => Err(StoreError::NotLive { address }),
        }
    }

    /// Move a live agent out of its slot, leaving it marked checked-out.
    pub fn check_out(&mut self, id: AgentId) -> Result<Box<dyn Agent>, StoreError> {
        let address = self.address(id);
        let slot = self.slot_mut(id)?;
        match std::mem::replace(slot, Slot::CheckedOut) {
            Slot::Live(agent) => Ok(agent),
            other => {
                *slot = other;
                Err(StoreError::NotLive { address })
            }
        }
    }

    /// Return a checked-out agent to its slot.
    pub fn check_in(&mut self, id: AgentId, agent: Box<dyn Agent>) -> Result<(), StoreError> {
        let address = self.address(id);
        let slot = self.slot_mut(id)?;
        if !matches!(slot, Slot::CheckedOut) {
            return Err(StoreError::Occupied { address });
        }
        *slot = Slot::Live(agent);
        Ok(())
    }

    /// Iterate over slot states in id order.
    pub fn slots(&self) -> impl Iterator<Item = (AgentId, &Slot)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| slot_id(i).map(|id| (id, s)))
    }

    fn address(&self, id: AgentId) -> AgentAddress {
        AgentAddress {
            group: self.name.clone(),
            id,
        }
    }

    fn slot_mut(&mut self, id: AgentId) -> Result<&mut Slot, StoreError> {
        let len = self.slots.len();
        self.slots
            .get_mut(id.index())
            .ok_or_else(|| StoreError::OutOfRange {
                group: self.name.clone(),
                id,
                len,
            })
    }
}

/// The id addressing slot `index`, if it fits in an [`AgentId`].
fn slot_id(index: usize) -> Option<AgentId> {
    u32::try_from(index).ok().map(AgentId)
}
