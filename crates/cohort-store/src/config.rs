//! Store configuration parameters.

use crate::error::StoreError;

/// Configuration for the agent store.
///
/// Validated at construction; immutable afterwards.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Number of worker partitions agents are spread across.
    ///
    /// Slot `id` lives on partition `id % workers`. Must be at least 1.
    pub workers: usize,

    /// Initial slot capacity reserved for each new group.
    ///
    /// Default: 0. Collections grow on demand regardless.
    pub initial_capacity: usize,
}

impl StoreConfig {
    /// Upper bound on worker partitions.
    pub const MAX_WORKERS: usize = 64;

    /// Create a config with an explicit worker count.
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            initial_capacity: 0,
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.workers == 0 || self.workers > Self::MAX_WORKERS {
            return Err(StoreError::InvalidWorkerCount {
                configured: self.workers,
            });
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    /// One partition per available CPU, clamped to `[1, MAX_WORKERS]`.
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(cpus.clamp(1, Self::MAX_WORKERS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(StoreConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_workers_rejected() {
        assert!(matches!(
            StoreConfig::new(0).validate(),
            Err(StoreError::InvalidWorkerCount { configured: 0 })
        ));
    }
}
