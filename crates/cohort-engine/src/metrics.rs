//! Per-dispatch performance metrics.
//!
//! [`DispatchMetrics`] captures timing and volume for a single dispatch,
//! for profiling and for the debug log line each dispatch emits.

/// Timing and volume metrics collected during a single dispatch.
///
/// All durations are in microseconds. The group stores the metrics of its
/// most recent dispatch; read them with
/// [`Group::last_metrics`](crate::Group::last_metrics).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchMetrics {
    /// Live agents the command reached.
    pub agents: usize,
    /// Messages routed during the delivery phase.
    pub messages: usize,
    /// Wall-clock time for the compute phase, in microseconds.
    pub compute_us: u64,
    /// Wall-clock time for the delivery phase, in microseconds.
    pub deliver_us: u64,
    /// Wall-clock time for the entire dispatch, in microseconds.
    pub total_us: u64,
    /// Worker threads used by the compute phase (1 when sequential).
    pub workers_used: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = DispatchMetrics::default();
        assert_eq!(m.agents, 0);
        assert_eq!(m.messages, 0);
        assert_eq!(m.total_us, 0);
        assert_eq!(m.workers_used, 0);
    }
}
