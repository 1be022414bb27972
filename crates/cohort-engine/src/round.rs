//! End-of-round sweep over a group's selection.
//!
//! Each live agent is offered the round, in selection order:
//!
//! - no round hook: skipped, not an error;
//! - cancellation (token set, or the hook returned `Cancelled`): the sweep
//!   stops and reports success;
//! - any other hook error: the sweep stops and the fault is returned.
//!
//! Fault reporting happens after the store lock is released, see
//! [`report_fault`].

use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::thread;
use std::time::Duration;

use rand::Rng;

use cohort_core::{AgentAddress, AgentError, RoundId};
use cohort_store::{AgentStore, StoreError};

use crate::cancel::CancelToken;
use crate::error::GroupError;

/// Summary of one round sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoundReport {
    /// The round that was advanced.
    pub round: RoundId,
    /// Agents whose hook ran successfully.
    pub advanced: usize,
    /// Agents without a round hook.
    pub skipped: usize,
    /// Whether the sweep stopped on a cancellation request.
    pub cancelled: bool,
}

/// Why a sweep stopped early with an error.
#[derive(Debug)]
pub(crate) enum SweepError {
    Hook {
        address: AgentAddress,
        source: AgentError,
        backtrace: Backtrace,
    },
    Store(StoreError),
}

impl From<StoreError> for SweepError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

pub(crate) fn sweep(
    store: &mut AgentStore,
    targets: &[AgentAddress],
    round: RoundId,
    cancel: &CancelToken,
) -> Result<RoundReport, SweepError> {
    let mut report = RoundReport {
        round,
        ..RoundReport::default()
    };
    for address in targets {
        if cancel.is_cancelled() {
            tracing::warn!(%round, next = %address, "round sweep cancelled");
            report.cancelled = true;
            break;
        }
        let agent = store.agent_mut(address)?;
        let Some(hook) = agent.round_hook() else {
            report.skipped += 1;
            continue;
        };
        match hook.advance_round(round) {
            Ok(()) => report.advanced += 1,
            Err(e) if e.is_cancellation() => {
                tracing::warn!(%round, agent = %address, "round sweep cancelled by agent");
                report.cancelled = true;
                break;
            }
            Err(source) => {
                return Err(SweepError::Hook {
                    address: address.clone(),
                    source,
                    backtrace: Backtrace::force_capture(),
                })
            }
        }
    }
    Ok(report)
}

/// Delay, log, and wrap a round-hook fault.
///
/// `backtrace` is the stack of the sweep at the moment the hook returned
/// its error; what happened inside the agent is carried by the error
/// chain. The random delay spreads out reports from sweeps that fail
/// together on several workers.
pub(crate) fn report_fault(
    address: AgentAddress,
    round: RoundId,
    source: AgentError,
    backtrace: Backtrace,
    max_jitter: Duration,
) -> GroupError {
    let delay = jitter(max_jitter);
    if !delay.is_zero() {
        thread::sleep(delay);
    }
    tracing::error!(
        group = %address.group,
        agent = %address.id,
        %round,
        error = %error_chain(&source),
        %backtrace,
        "round hook failed, stopping sweep"
    );
    GroupError::RoundFailed {
        address,
        round,
        source,
    }
}

fn jitter(max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    rand::thread_rng().gen_range(Duration::ZERO..max)
}

/// `Display` of an error followed by each of its sources.
fn error_chain(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut cause = err.source();
    while let Some(e) = cause {
        out.push_str(": ");
        out.push_str(&e.to_string());
        cause = e.source();
    }
    out
}
