//! Id recycling for the owning group.
//!
//! Ids released by `delete` are queued FIFO and handed out again by
//! `append` before any new slot is minted. An id is in the queue exactly
//! while its slot is tombstoned, so a live id is never reissued.

use std::collections::VecDeque;

use cohort_core::AgentId;

/// FIFO free-id queue for one single-name group.
#[derive(Clone, Debug, Default)]
pub struct IdentityManager {
    free: VecDeque<AgentId>,
}

impl IdentityManager {
    /// Create a manager with an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the oldest reclaimed id, if any.
    pub fn acquire(&mut self) -> Option<AgentId> {
        self.free.pop_front()
    }

    /// Queue a tombstoned id for reuse.
    pub fn release(&mut self, id: AgentId) {
        debug_assert!(!self.free.contains(&id), "id {id} released twice");
        self.free.push_back(id);
    }

    /// Put back an id whose reuse failed, ahead of every other id.
    pub fn restore(&mut self, id: AgentId) {
        self.free.push_front(id);
    }

    /// Whether `id` is waiting for reuse.
    pub fn contains(&self, id: AgentId) -> bool {
        self.free.contains(&id)
    }

    /// Number of queued ids.
    pub fn len(&self) -> usize {
        self.free.len()
    }

    /// Whether no id is waiting for reuse.
    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// Queued ids in reuse order.
    pub fn free_ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.free.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuse_is_fifo() {
        let mut ids = IdentityManager::new();
        ids.release(AgentId(4));
        ids.release(AgentId(1));
        assert_eq!(ids.acquire(), Some(AgentId(4)));
        assert_eq!(ids.acquire(), Some(AgentId(1)));
        assert_eq!(ids.acquire(), None);
    }

    #[test]
    fn restore_jumps_the_queue() {
        let mut ids = IdentityManager::new();
        ids.release(AgentId(2));
        ids.release(AgentId(3));
        let taken = ids.acquire().unwrap();
        ids.restore(taken);
        assert_eq!(ids.free_ids().collect::<Vec<_>>(), vec![AgentId(2), AgentId(3)]);
    }
}
