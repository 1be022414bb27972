//! Strongly-typed identifiers: agent ids, group names, rounds and addresses.

use std::fmt;
use std::sync::Arc;

/// Identifies an agent slot within one named group.
///
/// `AgentId(n)` is the n-th slot of the group's collection in the agent
/// store. Slots are never compacted or reordered, so an id keeps its
/// positional meaning for the lifetime of the simulation. After a delete
/// the id may be handed out again by the owning group's free list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u32);

impl AgentId {
    /// The slot index this id addresses.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for AgentId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Name of an agent collection in the store (e.g. `"firm"`, `"household"`).
///
/// Cheap to clone: the string is shared behind an `Arc`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupName(Arc<str>);

impl GroupName {
    /// Create a group name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupName {
    fn from(v: &str) -> Self {
        Self::new(v)
    }
}

impl From<String> for GroupName {
    fn from(v: String) -> Self {
        Self(Arc::from(v))
    }
}

impl AsRef<str> for GroupName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Round counter supplied by the simulation driver.
///
/// The driver increments it once per superstep; groups never advance it
/// themselves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoundId(pub u64);

impl RoundId {
    /// The round after this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RoundId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Fully-qualified location of one agent: group name plus slot id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentAddress {
    /// The collection holding the agent.
    pub group: GroupName,
    /// The slot within that collection.
    pub id: AgentId,
}

impl AgentAddress {
    /// Build an address from its parts.
    pub fn new(group: impl Into<GroupName>, id: impl Into<AgentId>) -> Self {
        Self {
            group: group.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for AgentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.group, self.id)
    }
}
