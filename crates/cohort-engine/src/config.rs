//! Group configuration, validation, and error types.
//!
//! [`GroupConfig`] is the construction input for a [`Group`](crate::Group).
//! [`validate()`](GroupConfig::validate) checks structural invariants before
//! any collection is created in the store.

use std::time::Duration;

use thiserror::Error;

// ── DispatchMode ───────────────────────────────────────────────────

/// How the compute phase of a dispatch runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DispatchMode {
    /// Every agent runs on the caller's thread, in selection order.
    #[default]
    Sequential,
    /// Selected agents are split into one contiguous chunk per worker and
    /// run on scoped threads. Delivery still waits for every chunk.
    Parallel,
}

// ── GroupConfig ────────────────────────────────────────────────────

/// Configuration for a [`Group`](crate::Group).
///
/// Views created by `select` and `union` inherit the configuration of the
/// group they were derived from.
#[derive(Clone, Debug)]
pub struct GroupConfig {
    /// Number of workers used by [`DispatchMode::Parallel`]. `None` = use
    /// the store's partition count. Explicit values must lie in `[1, 64]`.
    pub workers: Option<usize>,
    /// Compute-phase strategy. Default: [`DispatchMode::Sequential`].
    pub dispatch_mode: DispatchMode,
    /// Upper bound of the random delay applied before a round fault is
    /// reported. Zero disables the delay. Default: 1 s.
    pub fault_jitter: Duration,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            workers: None,
            dispatch_mode: DispatchMode::Sequential,
            fault_jitter: Duration::from_secs(1),
        }
    }
}

impl GroupConfig {
    /// Upper bound on explicit worker counts.
    pub const MAX_WORKERS: usize = 64;

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(n) = self.workers {
            if n == 0 || n > Self::MAX_WORKERS {
                return Err(ConfigError::InvalidWorkerCount { configured: n });
            }
        }
        Ok(())
    }

    /// Resolve the worker count, falling back to the store's partitions.
    pub fn resolved_worker_count(&self, store_workers: usize) -> usize {
        self.workers
            .unwrap_or(store_workers)
            .clamp(1, Self::MAX_WORKERS)
    }

    /// Shorthand for a parallel configuration with `workers` threads.
    pub fn parallel(workers: usize) -> Self {
        Self {
            workers: Some(workers),
            dispatch_mode: DispatchMode::Parallel,
            ..Self::default()
        }
    }

    /// Replace the fault jitter bound.
    pub fn with_fault_jitter(mut self, jitter: Duration) -> Self {
        self.fault_jitter = jitter;
        self
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`GroupConfig::validate()`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Explicit worker count outside `[1, 64]`.
    #[error("worker count {configured} is outside [1, 64]")]
    InvalidWorkerCount {
        /// The configured value.
        configured: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid_and_sequential() {
        let cfg = GroupConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.dispatch_mode, DispatchMode::Sequential);
        assert_eq!(cfg.fault_jitter, Duration::from_secs(1));
    }

    #[test]
    fn zero_workers_rejected() {
        let cfg = GroupConfig {
            workers: Some(0),
            ..GroupConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvalidWorkerCount { configured: 0 })
        );
    }

    #[test]
    fn too_many_workers_rejected() {
        assert!(GroupConfig::parallel(65).validate().is_err());
        assert!(GroupConfig::parallel(64).validate().is_ok());
    }

    #[test]
    fn auto_workers_follow_store() {
        let cfg = GroupConfig::default();
        assert_eq!(cfg.resolved_worker_count(3), 3);
        assert_eq!(GroupConfig::parallel(2).resolved_worker_count(8), 2);
    }
}
