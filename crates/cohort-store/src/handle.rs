//! Shared handle to an [`AgentStore`].
//!
//! Every group view over the same agents holds a clone of one
//! [`StoreHandle`]. The mutex serialises structural mutation (slot creation
//! and tombstoning) and agent execution across views and threads.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::store::AgentStore;

/// Cheaply clonable, thread-safe reference to one [`AgentStore`].
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<Mutex<AgentStore>>,
}

impl StoreHandle {
    /// Build a new store and wrap it.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        Ok(Self::from_store(AgentStore::new(config)?))
    }

    /// Wrap an existing store.
    pub fn from_store(store: AgentStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Lock the store for the duration of one group operation.
    pub fn lock(&self) -> Result<MutexGuard<'_, AgentStore>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Whether two handles refer to the same store.
    pub fn same_store(&self, other: &StoreHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle")
            .field("views", &Arc::strong_count(&self.inner))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohort_core::GroupName;

    #[test]
    fn clones_share_one_store() {
        let a = StoreHandle::new(StoreConfig::new(1)).unwrap();
        let b = a.clone();
        a.lock().unwrap().new_group(GroupName::from("firm")).unwrap();
        assert!(b.lock().unwrap().contains_group(&GroupName::from("firm")));
        assert!(a.same_store(&b));
    }

    #[test]
    fn separate_stores_are_distinct() {
        let a = StoreHandle::new(StoreConfig::new(1)).unwrap();
        let b = StoreHandle::new(StoreConfig::new(1)).unwrap();
        assert!(!a.same_store(&b));
    }

    #[test]
    fn poisoned_lock_reported() {
        let handle = StoreHandle::new(StoreConfig::new(1)).unwrap();
        let h2 = handle.clone();
        let _ = std::thread::spawn(move || {
            let _guard = h2.lock().unwrap();
            panic!("poison the store");
        })
        .join();
        assert!(matches!(handle.lock(), Err(StoreError::Poisoned)));
    }
}
