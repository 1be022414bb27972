//! Two-phase dispatch: compute, barrier, deliver.
//!
//! # Protocol
//!
//! 1. **Compute.** Every resolved agent handles the command, in selection
//!    order. Messages an agent sends go to an [`Outbox`] owned here, not
//!    to the recipient. The first failure aborts the phase.
//! 2. **Barrier.** In sequential mode the loop ending is the barrier. In
//!    parallel mode every worker thread is joined before anything else
//!    happens.
//! 3. **Deliver.** Outboxes are drained in selection order and routed
//!    through the store to each recipient's `receive`.
//!
//! Results come back in selection order regardless of mode.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use cohort_core::{Agent, AgentAddress, AgentError, CommandContext, Outbox, RoundId, Value};
use cohort_store::{AgentStore, StoreError};

use crate::config::DispatchMode;
use crate::error::GroupError;
use crate::metrics::DispatchMetrics;

/// One command invocation, shared read-only by every worker.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Call<'a> {
    pub command: &'a str,
    pub args: &'a [Value],
    pub last_command: &'a str,
    pub round: RoundId,
}

/// Output of a completed dispatch.
#[derive(Debug)]
pub(crate) struct Dispatched {
    pub results: Vec<Value>,
    pub metrics: DispatchMetrics,
}

/// Run both phases of `call` against `targets`.
pub(crate) fn run(
    store: &mut AgentStore,
    targets: &[AgentAddress],
    call: &Call<'_>,
    mode: DispatchMode,
    workers: usize,
) -> Result<Dispatched, GroupError> {
    let start = Instant::now();

    let (results, outboxes, workers_used) = match mode {
        DispatchMode::Sequential => {
            let (results, outboxes) = compute_sequential(store, targets, call)?;
            (results, outboxes, 1)
        }
        DispatchMode::Parallel => compute_parallel(store, targets, call, workers)?,
    };
    let compute_us = start.elapsed().as_micros() as u64;

    let deliver_start = Instant::now();
    let mut messages = 0;
    for mut outbox in outboxes {
        messages += store.deliver_all(outbox.drain())?;
    }
    let deliver_us = deliver_start.elapsed().as_micros() as u64;

    Ok(Dispatched {
        metrics: DispatchMetrics {
            agents: results.len(),
            messages,
            compute_us,
            deliver_us,
            total_us: start.elapsed().as_micros() as u64,
            workers_used,
        },
        results,
    })
}

fn call_agent(
    agent: &mut dyn Agent,
    address: &AgentAddress,
    call: &Call<'_>,
) -> (Result<Value, AgentError>, Outbox) {
    let mut outbox = Outbox::new(address.clone());
    let result = {
        let mut ctx = CommandContext::new(call.last_command, call.round, &mut outbox);
        agent.handle(&mut ctx, call.command, call.args)
    };
    tracing::trace!(agent = %address, command = call.command, ok = result.is_ok(), "agent call");
    (result, outbox)
}

fn agent_error(address: &AgentAddress, call: &Call<'_>, source: AgentError) -> GroupError {
    GroupError::Agent {
        address: address.clone(),
        command: call.command.to_owned(),
        source,
    }
}

fn compute_sequential(
    store: &mut AgentStore,
    targets: &[AgentAddress],
    call: &Call<'_>,
) -> Result<(Vec<Value>, Vec<Outbox>), GroupError> {
    let mut results = Vec::with_capacity(targets.len());
    let mut outboxes = Vec::with_capacity(targets.len());
    for address in targets {
        let agent = store.agent_mut(address)?;
        let (result, outbox) = call_agent(agent, address, call);
        results.push(result.map_err(|e| agent_error(address, call, e))?);
        outboxes.push(outbox);
    }
    Ok((results, outboxes))
}

/// An agent moved out of the store for the compute phase.
struct CheckedOut {
    index: usize,
    address: AgentAddress,
    agent: Box<dyn Agent>,
}

fn check_out_all(
    store: &mut AgentStore,
    targets: &[AgentAddress],
) -> Result<Vec<CheckedOut>, GroupError> {
    let mut seen = HashSet::with_capacity(targets.len());
    if let Some(dup) = targets.iter().find(|a| !seen.insert(*a)) {
        return Err(GroupError::DuplicateSelection {
            address: dup.clone(),
        });
    }

    let mut checked = Vec::with_capacity(targets.len());
    for (index, address) in targets.iter().enumerate() {
        match store
            .collection_mut(&address.group)
            .and_then(|c| c.check_out(address.id))
        {
            Ok(agent) => checked.push(CheckedOut {
                index,
                address: address.clone(),
                agent,
            }),
            Err(e) => {
                check_in_all(store, checked)?;
                return Err(e.into());
            }
        }
    }
    Ok(checked)
}

fn check_in_all(store: &mut AgentStore, checked: Vec<CheckedOut>) -> Result<(), StoreError> {
    for CheckedOut { address, agent, .. } in checked {
        store.collection_mut(&address.group)?.check_in(address.id, agent)?;
    }
    Ok(())
}

type Outcome = (usize, Result<Value, AgentError>, Outbox);

fn compute_parallel(
    store: &mut AgentStore,
    targets: &[AgentAddress],
    call: &Call<'_>,
    workers: usize,
) -> Result<(Vec<Value>, Vec<Outbox>, usize), GroupError> {
    let mut checked = check_out_all(store, targets)?;
    let chunk_size = targets.len().div_ceil(workers.max(1)).max(1);
    let abort = AtomicBool::new(false);
    let (tx, rx) = crossbeam_channel::unbounded::<Outcome>();

    let (workers_used, panicked) = thread::scope(|s| {
        let handles: Vec<_> = checked
            .chunks_mut(chunk_size)
            .map(|chunk| {
                let tx = tx.clone();
                let abort = &abort;
                s.spawn(move || {
                    for slot in chunk {
                        if abort.load(Ordering::Acquire) {
                            break;
                        }
                        let (result, outbox) = call_agent(slot.agent.as_mut(), &slot.address, call);
                        if result.is_err() {
                            abort.store(true, Ordering::Release);
                        }
                        // The receiver outlives the scope.
                        let _ = tx.send((slot.index, result, outbox));
                    }
                })
            })
            .collect();
        let spawned = handles.len();
        // Explicit barrier: no delivery before every chunk has returned.
        let panics = handles
            .into_iter()
            .map(|h| h.join())
            .filter(Result::is_err)
            .count();
        (spawned, panics > 0)
    });
    drop(tx);

    check_in_all(store, checked)?;
    if panicked {
        return Err(GroupError::WorkerPanicked);
    }

    let mut slots: Vec<Option<(Value, Outbox)>> = (0..targets.len()).map(|_| None).collect();
    let mut first_error: Option<(usize, AgentError)> = None;
    for (index, result, outbox) in rx.iter() {
        match result {
            Ok(value) => slots[index] = Some((value, outbox)),
            Err(e) => {
                if first_error.as_ref().is_none_or(|(i, _)| index < *i) {
                    first_error = Some((index, e));
                }
            }
        }
    }
    if let Some((index, source)) = first_error {
        return Err(agent_error(&targets[index], call, source));
    }

    let (results, outboxes): (Vec<Value>, Vec<Outbox>) = slots.into_iter().flatten().unzip();
    Ok((results, outboxes, workers_used))
}
