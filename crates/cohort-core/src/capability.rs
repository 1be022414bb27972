//! The [`CapabilitySet`]: command names a group can forward.

use indexmap::IndexSet;

/// Name of the one-time initializer. Never forwardable.
pub const INIT_COMMAND: &str = "init";

/// Whether `name` may appear in a declared command set.
///
/// The initializer and underscore-prefixed internal names are excluded,
/// as is the empty string.
pub fn is_forwardable(name: &str) -> bool {
    !name.is_empty() && name != INIT_COMMAND && !name.starts_with('_')
}

/// An insertion-ordered set of command names.
///
/// Each agent class declares one; a group's set is the intersection of the
/// sets of every class it spans and is fixed once the group is built.
/// Equality ignores order.
#[derive(Clone, Debug, Default)]
pub struct CapabilitySet {
    names: IndexSet<String>,
}

impl CapabilitySet {
    /// Create an empty capability set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Insert a command name. Non-forwardable names are ignored and
    /// `false` is returned.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if !is_forwardable(&name) {
            return false;
        }
        self.names.insert(name)
    }

    /// Check whether the set contains a command name.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Return the intersection of two sets, keeping `self`'s order.
    pub fn intersection(&self, other: &Self) -> Self {
        Self {
            names: self
                .names
                .iter()
                .filter(|n| other.names.contains(n.as_str()))
                .cloned()
                .collect(),
        }
    }

    /// Intersect a sequence of sets. An empty sequence yields the empty set.
    pub fn intersect_all<'a, I>(sets: I) -> Self
    where
        I: IntoIterator<Item = &'a CapabilitySet>,
    {
        let mut iter = sets.into_iter();
        let Some(first) = iter.next() else {
            return Self::empty();
        };
        iter.fold(first.clone(), |acc, s| acc.intersection(s))
    }

    /// Check whether `self` is a subset of `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.names.iter().all(|n| other.names.contains(n.as_str()))
    }

    /// Returns `true` if the set contains no commands.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the number of commands in the set.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Iterate over the command names in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }
}

impl PartialEq for CapabilitySet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.is_subset(other)
    }
}

impl Eq for CapabilitySet {}

impl<S: Into<String>> FromIterator<S> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::empty();
        for name in iter {
            set.insert(name);
        }
        set
    }
}
