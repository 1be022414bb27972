//! The [`AgentStore`]: every named collection plus selection resolution
//! and message routing.

use indexmap::IndexMap;

use cohort_core::{Agent, AgentAddress, AgentId, GroupName, Message};

use crate::collection::Collection;
use crate::config::StoreConfig;
use crate::error::StoreError;

/// Per-name, growable, indexed agent storage shared by every group view.
///
/// Groups never own agents; they hold ids and resolve them here. Only
/// identity operations on an owning group change a collection's shape.
#[derive(Debug)]
pub struct AgentStore {
    config: StoreConfig,
    groups: IndexMap<GroupName, Collection>,
}

impl AgentStore {
    /// Create an empty store.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        config.validate()?;
        Ok(Self {
            config,
            groups: IndexMap::new(),
        })
    }

    /// The configuration the store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of worker partitions.
    pub fn workers(&self) -> usize {
        self.config.workers
    }

    /// Worker partition holding slot `id`.
    pub fn worker_of(&self, id: AgentId) -> usize {
        id.index() % self.config.workers
    }

    /// Create the collection for a name on first use.
    pub fn new_group(&mut self, name: GroupName) -> Result<(), StoreError> {
        if self.groups.contains_key(&name) {
            return Err(StoreError::GroupExists { group: name });
        }
        tracing::debug!(group = %name, "creating agent collection");
        let collection = Collection::new(name.clone(), self.config.initial_capacity);
        self.groups.insert(name, collection);
        Ok(())
    }

    /// Whether a collection exists for `name`.
    pub fn contains_group(&self, name: &GroupName) -> bool {
        self.groups.contains_key(name)
    }

    /// Collection names in creation order.
    pub fn group_names(&self) -> impl Iterator<Item = &GroupName> + '_ {
        self.groups.keys()
    }

    /// Shared access to one collection.
    pub fn collection(&self, name: &GroupName) -> Result<&Collection, StoreError> {
        self.groups
            .get(name)
            .ok_or_else(|| StoreError::UnknownGroup {
                group: name.clone(),
            })
    }

    /// Mutable access to one collection.
    pub fn collection_mut(&mut self, name: &GroupName) -> Result<&mut Collection, StoreError> {
        self.groups
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownGroup {
                group: name.clone(),
            })
    }

    /// Whether `address` holds a live agent.
    pub fn is_live(&self, address: &AgentAddress) -> bool {
        self.groups
            .get(&address.group)
            .is_some_and(|c| c.is_live(address.id))
    }

    /// Shared access to a live agent.
    pub fn agent(&self, address: &AgentAddress) -> Result<&dyn Agent, StoreError> {
        self.collection(&address.group)?.get(address.id)
    }

    /// Mutable access to a live agent.
    pub fn agent_mut(&mut self, address: &AgentAddress) -> Result<&mut dyn Agent, StoreError> {
        self.collection_mut(&address.group)?.get_mut(address.id)
    }

    /// Live-agent counts per worker partition for one collection.
    pub fn partition_sizes(&self, name: &GroupName) -> Result<Vec<usize>, StoreError> {
        let collection = self.collection(name)?;
        let mut sizes = vec![0; self.config.workers];
        for (id, slot) in collection.slots() {
            if slot.is_live() {
                sizes[self.worker_of(id)] += 1;
            }
        }
        Ok(sizes)
    }

    /// Map per-name id lists to the addresses of live agents.
    ///
    /// Addresses come back in view order, then selection order within each
    /// view. Empty selection entries and tombstoned slots are skipped;
    /// unknown names and ids past the end of a collection are errors.
    /// Duplicated ids resolve once per occurrence.
    pub fn resolve<'a, I>(&self, views: I) -> Result<Vec<AgentAddress>, StoreError>
    where
        I: IntoIterator<Item = (&'a GroupName, &'a [Option<AgentId>])>,
    {
        let mut out = Vec::new();
        for (name, selection) in views {
            let collection = self.collection(name)?;
            for id in selection.iter().flatten().copied() {
                if id.index() >= collection.len() {
                    return Err(StoreError::OutOfRange {
                        group: name.clone(),
                        id,
                        len: collection.len(),
                    });
                }
                if collection.is_live(id) {
                    out.push(AgentAddress {
                        group: name.clone(),
                        id,
                    });
                }
            }
        }
        Ok(out)
    }

    /// Route one message to its recipient's [`Agent::receive`].
    pub fn deliver(&mut self, message: Message) -> Result<(), StoreError> {
        let from = message.from.clone();
        let to = message.to.clone();
        let recipient = match self.agent_mut(&to) {
            Ok(agent) => agent,
            Err(e) => {
                return Err(StoreError::Delivery {
                    from,
                    to,
                    source: Box::new(e),
                })
            }
        };
        tracing::trace!(%from, %to, topic = %message.topic, "delivering message");
        recipient
            .receive(message)
            .map_err(|source| StoreError::Rejected {
                address: to,
                source,
            })
    }

    /// Route a batch of messages in order, stopping at the first failure.
    ///
    /// Returns the number of messages delivered.
    pub fn deliver_all(&mut self, messages: Vec<Message>) -> Result<usize, StoreError> {
        let n = messages.len();
        for message in messages {
            self.deliver(message)?;
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohort_test_utils::{Journal, NullAgent, RecordingAgent};

    fn store_with(name: &str, agents: usize) -> AgentStore {
        let mut store = AgentStore::new(StoreConfig::new(2)).unwrap();
        let name = GroupName::from(name);
        store.new_group(name.clone()).unwrap();
        let c = store.collection_mut(&name).unwrap();
        for _ in 0..agents {
            let id = c.reserve_slot().unwrap();
            c.install(id, Box::new(NullAgent)).unwrap();
        }
        store
    }

    #[test]
    fn duplicate_group_rejected() {
        let mut store = store_with("firm", 0);
        assert!(matches!(
            store.new_group(GroupName::from("firm")),
            Err(StoreError::GroupExists { .. })
        ));
    }

    #[test]
    fn resolve_skips_tombstones_and_holes() {
        let mut store = store_with("firm", 3);
        let name = GroupName::from("firm");
        store
            .collection_mut(&name)
            .unwrap()
            .tombstone(AgentId(1))
            .unwrap();

        let selection = [Some(AgentId(0)), None, Some(AgentId(1)), Some(AgentId(2))];
        let resolved = store.resolve([(&name, &selection[..])]).unwrap();
        let ids: Vec<u32> = resolved.iter().map(|a| a.id.0).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn resolve_keeps_selection_order() {
        let store = store_with("firm", 3);
        let name = GroupName::from("firm");
        let selection = [Some(AgentId(2)), Some(AgentId(0))];
        let ids: Vec<u32> = store
            .resolve([(&name, &selection[..])])
            .unwrap()
            .iter()
            .map(|a| a.id.0)
            .collect();
        assert_eq!(ids, vec![2, 0]);
    }

    #[test]
    fn resolve_unknown_group_fails() {
        let store = store_with("firm", 1);
        let other = GroupName::from("bank");
        let selection = [Some(AgentId(0))];
        assert!(matches!(
            store.resolve([(&other, &selection[..])]),
            Err(StoreError::UnknownGroup { .. })
        ));
    }

    #[test]
    fn resolve_out_of_range_fails() {
        let store = store_with("firm", 1);
        let name = GroupName::from("firm");
        let selection = [Some(AgentId(9))];
        assert!(matches!(
            store.resolve([(&name, &selection[..])]),
            Err(StoreError::OutOfRange { .. })
        ));
    }

    #[test]
    fn deliver_reaches_recipient() {
        let journal = Journal::new();
        let mut store = AgentStore::new(StoreConfig::new(1)).unwrap();
        let name = GroupName::from("household");
        store.new_group(name.clone()).unwrap();
        let c = store.collection_mut(&name).unwrap();
        let id = c.reserve_slot().unwrap();
        let address = AgentAddress::new("household", id);
        c.install(id, Box::new(RecordingAgent::new(address.clone(), journal.clone())))
            .unwrap();

        let msg = Message::new(AgentAddress::new("firm", 0u32), address.clone(), "wage", 5i64);
        assert_eq!(store.deliver_all(vec![msg]).unwrap(), 1);
        assert_eq!(journal.received_by(&address), 1);
    }

    #[test]
    fn deliver_to_tombstone_fails() {
        let mut store = store_with("household", 1);
        let name = GroupName::from("household");
        store
            .collection_mut(&name)
            .unwrap()
            .tombstone(AgentId(0))
            .unwrap();
        let msg = Message::new(
            AgentAddress::new("firm", 0u32),
            AgentAddress::new("household", 0u32),
            "wage",
            5i64,
        );
        let err = store.deliver(msg).unwrap_err();
        assert!(matches!(err, StoreError::Delivery { .. }));
    }

    #[test]
    fn partitions_follow_id_modulo_workers() {
        let store = store_with("firm", 5);
        let sizes = store.partition_sizes(&GroupName::from("firm")).unwrap();
        assert_eq!(sizes, vec![3, 2]);
        assert_eq!(store.worker_of(AgentId(3)), 1);
    }
}
