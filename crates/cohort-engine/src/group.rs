//! The [`Group`] proxy.
//!
//! A group is a view over one or more named agent collections in a shared
//! [`StoreHandle`]. It owns only selection metadata and its capability
//! set; agents stay in the store.
//!
//! Three kinds of group exist:
//!
//! - the **owning** group from [`Group::new`]: one name, a free-id queue,
//!   may `append` and `delete`;
//! - **selections** from [`Group::select`]: same names, explicit ids;
//! - **composites** from [`Group::union`]: several names, the intersected
//!   capability set.
//!
//! Only the owning group changes the shape of a collection.

use std::fmt;

use smallvec::SmallVec;

use cohort_core::{
    is_logging_command, AgentAddress, AgentClass, AgentError, AgentId, CapabilitySet, GroupName,
    Params, RoundId, Spawn, Value, AGG_LOG_COMMAND, INIT_COMMAND, PANEL_LOG_COMMAND,
};
use cohort_store::StoreHandle;

use crate::cancel::CancelToken;
use crate::config::GroupConfig;
use crate::dispatch::{self, Call};
use crate::error::GroupError;
use crate::identity::IdentityManager;
use crate::logging::{AggregateRecord, LogRequest, PanelRecord};
use crate::metrics::DispatchMetrics;
use crate::round::{self, RoundReport, SweepError};

/// `last_command` before anything has been dispatched.
pub const BEGIN_OF_SIMULATION: &str = "begin_of_simulation";

/// Per-name storage; most groups address one or two names.
type PerName<T> = SmallVec<[T; 2]>;

/// Ids addressed within one name. `None` marks a deleted entry.
pub type Selection = Vec<Option<AgentId>>;

/// A proxy over a named, possibly composite, collection of agents.
///
/// # Examples
///
/// ```
/// use cohort_core::{Agent, AgentClass, AgentError, CommandContext, Message, Params, Value};
/// use cohort_engine::{Group, GroupConfig};
/// use cohort_store::{StoreConfig, StoreHandle};
///
/// struct Firm(i64);
///
/// impl Agent for Firm {
///     fn execute(&mut self, _: &mut CommandContext<'_>, _: &str, _: &[Value])
///         -> Result<Value, AgentError> {
///         self.0 += 1;
///         Ok(Value::Int(self.0))
///     }
///     fn receive(&mut self, _: Message) -> Result<(), AgentError> { Ok(()) }
/// }
///
/// let store = StoreHandle::new(StoreConfig::new(1)).unwrap();
/// let class = AgentClass::new("firm", ["produce"], |_| Box::new(Firm(0)));
/// let mut firms = Group::new(&store, "firm", class, GroupConfig::default()).unwrap();
/// firms.append_many(2, &Params::new()).unwrap();
///
/// let out = firms.dispatch("produce", &[]).unwrap();
/// assert_eq!(out, vec![Value::Int(1), Value::Int(1)]);
/// assert!(firms.dispatch("consume", &[]).is_err());
/// ```
pub struct Group {
    store: StoreHandle,
    names: PerName<GroupName>,
    classes: PerName<AgentClass>,
    selection: PerName<Selection>,
    capabilities: CapabilitySet,
    /// Present only on the owning group.
    identity: Option<IdentityManager>,
    fixed: Params,
    config: GroupConfig,
    workers: usize,
    last_command: String,
    round: RoundId,
    cancel: CancelToken,
    metrics: DispatchMetrics,
}

impl Group {
    /// Create the owning group for `name` and its collection in the store.
    ///
    /// # Errors
    ///
    /// [`GroupError::Config`] for an invalid config,
    /// [`GroupError::EmptyCapabilities`] if `class` declares no forwardable
    /// command, and `StoreError::GroupExists` if `name` already has an
    /// owner.
    pub fn new(
        store: &StoreHandle,
        name: impl Into<GroupName>,
        class: AgentClass,
        config: GroupConfig,
    ) -> Result<Self, GroupError> {
        config.validate()?;
        if class.commands().is_empty() {
            return Err(GroupError::EmptyCapabilities {
                kinds: vec![class.kind().to_owned()],
            });
        }
        let name = name.into();
        let workers = {
            let mut guard = store.lock()?;
            guard.new_group(name.clone())?;
            config.resolved_worker_count(guard.workers())
        };
        tracing::debug!(
            group = %name,
            kind = class.kind(),
            commands = class.commands().len(),
            workers,
            "created group"
        );
        Ok(Self {
            store: store.clone(),
            names: smallvec::smallvec![name],
            capabilities: class.commands().clone(),
            classes: smallvec::smallvec![class],
            selection: smallvec::smallvec![Vec::new()],
            identity: Some(IdentityManager::new()),
            fixed: Params::new(),
            config,
            workers,
            last_command: BEGIN_OF_SIMULATION.to_owned(),
            round: RoundId::default(),
            cancel: CancelToken::new(),
            metrics: DispatchMetrics::default(),
        })
    }

    /// Parameters passed to every agent this group creates, next to the
    /// per-agent construction parameters.
    pub fn with_fixed_params(mut self, fixed: Params) -> Self {
        self.fixed = fixed;
        self
    }

    /// Share `token` with this group and every view derived from it later.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    // ── accessors ──────────────────────────────────────────────────

    /// Names this group addresses, in union order.
    pub fn names(&self) -> &[GroupName] {
        &self.names
    }

    /// Agent classes, parallel to [`names()`](Self::names).
    pub fn classes(&self) -> &[AgentClass] {
        &self.classes
    }

    /// Selected ids, parallel to [`names()`](Self::names).
    pub fn selection(&self) -> &[Selection] {
        &self.selection
    }

    /// Commands this group forwards.
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// The most recent user command dispatched through this view.
    pub fn last_command(&self) -> &str {
        &self.last_command
    }

    /// The last round this view advanced to.
    pub fn round(&self) -> RoundId {
        self.round
    }

    /// Whether the group addresses more than one name.
    pub fn is_composite(&self) -> bool {
        self.names.len() > 1
    }

    /// Whether this group may `append` and `delete`.
    pub fn owns_identities(&self) -> bool {
        self.identity.is_some()
    }

    /// Ids queued for reuse, oldest first. `None` on views.
    pub fn free_ids(&self) -> Option<Vec<AgentId>> {
        self.identity.as_ref().map(|m| m.free_ids().collect())
    }

    /// The shared store.
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// The group configuration.
    pub fn config(&self) -> &GroupConfig {
        &self.config
    }

    /// Worker count used for parallel dispatch.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// The cancellation token checked by [`advance_round`](Self::advance_round).
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Metrics of the most recent dispatch through this view.
    pub fn last_metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }

    fn label(&self) -> String {
        self.names
            .iter()
            .map(GroupName::as_str)
            .collect::<Vec<_>>()
            .join("+")
    }

    fn views(&self) -> impl Iterator<Item = (&GroupName, &[Option<AgentId>])> + '_ {
        self.names
            .iter()
            .zip(self.selection.iter().map(Vec::as_slice))
    }

    fn derive(&self, selection: PerName<Selection>) -> Self {
        Self {
            store: self.store.clone(),
            names: self.names.clone(),
            classes: self.classes.clone(),
            selection,
            capabilities: self.capabilities.clone(),
            identity: None,
            fixed: self.fixed.clone(),
            config: self.config.clone(),
            workers: self.workers,
            last_command: self.last_command.clone(),
            round: self.round,
            cancel: self.cancel.clone(),
            metrics: DispatchMetrics::default(),
        }
    }

    // ── dispatch ───────────────────────────────────────────────────

    /// Run `command` on every live selected agent, then deliver the
    /// messages they sent.
    ///
    /// Returns one result per live agent, in selection order. Delivery
    /// starts only after every agent has returned. The first agent error
    /// aborts the call and nothing is delivered.
    pub fn dispatch(&mut self, command: &str, args: &[Value]) -> Result<Vec<Value>, GroupError> {
        if !is_logging_command(command) {
            if !self.capabilities.contains(command) {
                return Err(GroupError::UnsupportedCommand {
                    command: command.to_owned(),
                    group: self.label(),
                });
            }
            self.last_command = command.to_owned();
        }
        self.run(command, args).map(|(_, results)| results)
    }

    fn run(
        &mut self,
        command: &str,
        args: &[Value],
    ) -> Result<(Vec<AgentAddress>, Vec<Value>), GroupError> {
        let mut store = self.store.lock()?;
        let targets = store.resolve(self.views())?;
        let call = Call {
            command,
            args,
            last_command: &self.last_command,
            round: self.round,
        };
        let out = dispatch::run(
            &mut store,
            &targets,
            &call,
            self.config.dispatch_mode,
            self.workers,
        )?;
        drop(store);

        tracing::debug!(
            group = %self.label(),
            command,
            agents = out.metrics.agents,
            messages = out.metrics.messages,
            total_us = out.metrics.total_us,
            "dispatched"
        );
        self.metrics = out.metrics;
        Ok((targets, out.results))
    }

    // ── identity ───────────────────────────────────────────────────

    /// Create one agent and add it to the selection.
    ///
    /// Reuses the oldest deleted id if there is one; otherwise the new id
    /// equals the collection's current length. The agent's `init` runs
    /// before it is installed. If `init` fails the slot stays tombstoned
    /// and the id is reused by the next `append`.
    pub fn append(&mut self, params: &Params) -> Result<AgentId, GroupError> {
        let (Some(identity), [name], [class], [selection]) = (
            self.identity.as_mut(),
            self.names.as_slice(),
            self.classes.as_slice(),
            self.selection.as_mut_slice(),
        ) else {
            return Err(GroupError::CompositeIdentity {
                operation: "append",
                names: self.names.len(),
            });
        };

        let mut store = self.store.lock()?;
        let collection = store.collection_mut(name)?;
        let (id, reused) = match identity.acquire() {
            Some(id) => (id, true),
            None => (collection.reserve_slot()?, false),
        };

        let mut agent = class.spawn(Spawn {
            id,
            group: name,
            params,
            fixed: &self.fixed,
        });
        if let Err(source) = agent.init(params) {
            identity.restore(id);
            return Err(GroupError::Agent {
                address: AgentAddress {
                    group: name.clone(),
                    id,
                },
                command: INIT_COMMAND.to_owned(),
                source,
            });
        }
        collection.install(id, agent)?;

        if selection.len() <= id.index() {
            selection.resize(id.index() + 1, None);
        }
        selection[id.index()] = Some(id);
        tracing::debug!(group = %name, %id, reused, "appended agent");
        Ok(id)
    }

    /// [`append`](Self::append) `count` agents with the same parameters.
    pub fn append_many(&mut self, count: usize, params: &Params) -> Result<Vec<AgentId>, GroupError> {
        (0..count).map(|_| self.append(params)).collect()
    }

    /// Tombstone agent `id`, clear it from the selection and queue it for
    /// reuse.
    ///
    /// Deleting an id that is not live fails with `StoreError::NotLive`
    /// and leaves the free queue untouched.
    pub fn delete(&mut self, id: AgentId) -> Result<(), GroupError> {
        let (Some(identity), [name], [selection]) = (
            self.identity.as_mut(),
            self.names.as_slice(),
            self.selection.as_mut_slice(),
        ) else {
            return Err(GroupError::CompositeIdentity {
                operation: "delete",
                names: self.names.len(),
            });
        };

        self.store.lock()?.collection_mut(name)?.tombstone(id)?;
        if let Some(entry) = selection.get_mut(id.index()) {
            *entry = None;
        }
        identity.release(id);
        tracing::debug!(group = %name, %id, "deleted agent");
        Ok(())
    }

    // ── selection & composition ────────────────────────────────────

    /// A view addressing exactly `ids`, applied to every name.
    ///
    /// The view shares the store and classes but carries no free-id
    /// queue, so it can dispatch and advance rounds but not `append` or
    /// `delete`.
    pub fn select<I>(&self, ids: I) -> Group
    where
        I: IntoIterator,
        I::Item: Into<AgentId>,
    {
        let ids: Selection = ids.into_iter().map(|id| Some(id.into())).collect();
        let selection = self.names.iter().map(|_| ids.clone()).collect();
        self.derive(selection)
    }

    /// A view addressing a single id.
    pub fn select_one(&self, id: impl Into<AgentId>) -> Group {
        self.select([id.into()])
    }

    /// A composite over both groups' names and selections.
    ///
    /// The capability set is the intersection of both sets. Names stay
    /// distinct, so each agent is addressed at most once per name.
    ///
    /// # Errors
    ///
    /// [`GroupError::StoreMismatch`] if the groups use different stores,
    /// [`GroupError::OverlappingNames`] if both address the same name,
    /// [`GroupError::EmptyCapabilities`] if they share no command.
    pub fn union(&self, other: &Group) -> Result<Group, GroupError> {
        if !self.store.same_store(&other.store) {
            return Err(GroupError::StoreMismatch);
        }
        if let Some(name) = other.names.iter().find(|n| self.names.contains(n)) {
            return Err(GroupError::OverlappingNames { name: name.clone() });
        }
        let capabilities = self.capabilities.intersection(&other.capabilities);
        if capabilities.is_empty() {
            return Err(GroupError::EmptyCapabilities {
                kinds: self
                    .classes
                    .iter()
                    .chain(&other.classes)
                    .map(|c| c.kind().to_owned())
                    .collect(),
            });
        }
        let mut composite = self.derive(self.selection.clone());
        composite.names.extend(other.names.iter().cloned());
        composite.classes.extend(other.classes.iter().cloned());
        composite.selection.extend(other.selection.iter().cloned());
        composite.capabilities = capabilities;
        tracing::debug!(
            group = %composite.label(),
            commands = composite.capabilities.len(),
            "formed composite group"
        );
        Ok(composite)
    }

    /// Fold [`union`](Self::union) over a sequence of groups.
    pub fn union_all<'a, I>(groups: I) -> Result<Group, GroupError>
    where
        I: IntoIterator<Item = &'a Group>,
    {
        let mut iter = groups.into_iter();
        let first = iter.next().ok_or(GroupError::EmptyUnion)?;
        iter.try_fold(first.derive(first.selection.clone()), |acc, g| acc.union(g))
    }

    /// Number of selected ids whose slot holds a live agent, summed over
    /// every name.
    pub fn count(&self) -> Result<usize, GroupError> {
        let store = self.store.lock()?;
        let live = self
            .views()
            .flat_map(|(name, ids)| ids.iter().flatten().map(move |&id| (name, id)))
            .filter(|(name, id)| {
                store
                    .collection(name)
                    .is_ok_and(|c| c.is_live(*id))
            })
            .count();
        Ok(live)
    }

    // ── rounds ─────────────────────────────────────────────────────

    /// Offer `round` to every live selected agent's round hook, in order.
    ///
    /// Agents without a hook are skipped. A cancellation request stops the
    /// sweep and still returns `Ok`. Any other hook error stops the sweep,
    /// is logged with a backtrace after a random delay of up to
    /// [`GroupConfig::fault_jitter`], and is returned as
    /// [`GroupError::RoundFailed`] with the original error as its source.
    pub fn advance_round(&mut self, round: RoundId) -> Result<RoundReport, GroupError> {
        self.round = round;
        let outcome = {
            let mut store = self.store.lock()?;
            let targets = store.resolve(self.views())?;
            round::sweep(&mut store, &targets, round, &self.cancel)
        };
        match outcome {
            Ok(report) => {
                tracing::debug!(
                    group = %self.label(),
                    %round,
                    advanced = report.advanced,
                    skipped = report.skipped,
                    cancelled = report.cancelled,
                    "advanced round"
                );
                Ok(report)
            }
            Err(SweepError::Hook {
                address,
                source,
                backtrace,
            }) => Err(round::report_fault(
                address,
                round,
                source,
                backtrace,
                self.config.fault_jitter,
            )),
            Err(SweepError::Store(e)) => Err(e.into()),
        }
    }

    // ── logging ────────────────────────────────────────────────────

    /// Record the requested attributes of every live selected agent.
    ///
    /// Runs through the normal two-phase dispatch. `last_command` is left
    /// unchanged and reported as each record's context.
    pub fn panel_log(&mut self, request: &LogRequest) -> Result<Vec<PanelRecord>, GroupError> {
        let records: Vec<PanelRecord> = self
            .log_answers(PANEL_LOG_COMMAND, request)?
            .into_iter()
            .map(|(address, values)| PanelRecord {
                address,
                context: self.last_command.clone(),
                round: self.round,
                values,
            })
            .collect();
        tracing::debug!(group = %self.label(), records = records.len(), context = %self.last_command, "panel log");
        Ok(records)
    }

    /// Sum, count and mean of the requested numeric attributes over every
    /// live selected agent.
    pub fn agg_log(&mut self, request: &LogRequest) -> Result<AggregateRecord, GroupError> {
        let mut record = AggregateRecord::new(self.last_command.clone(), self.round);
        for (_, values) in self.log_answers(AGG_LOG_COMMAND, request)? {
            record.absorb(&values);
        }
        tracing::debug!(group = %self.label(), agents = record.agents, context = %record.context, "aggregate log");
        Ok(record)
    }

    /// Dispatch a logging command, then add the request's derived values
    /// to each answer.
    fn log_answers(
        &mut self,
        command: &str,
        request: &LogRequest,
    ) -> Result<Vec<(AgentAddress, Params)>, GroupError> {
        let args = request.to_args();
        let (targets, results) = self.run(command, &args)?;
        let mut answers = targets
            .into_iter()
            .zip(results)
            .map(|(address, value)| -> Result<(AgentAddress, Params), GroupError> {
                let values = log_values(&address, command, value)?;
                Ok((address, values))
            })
            .collect::<Result<Vec<_>, GroupError>>()?;
        if request.derived.is_empty() {
            return Ok(answers);
        }

        let store = self.store.lock()?;
        for (address, values) in &mut answers {
            let agent = store.agent(address)?;
            for (name, derive) in &request.derived {
                let value = derive(agent).ok_or_else(|| GroupError::Agent {
                    address: address.clone(),
                    command: command.to_owned(),
                    source: AgentError::invalid_argument(format!(
                        "derived value '{name}' is unavailable"
                    )),
                })?;
                values.insert(name.clone(), value);
            }
        }
        Ok(answers)
    }
}

fn log_values(address: &AgentAddress, command: &str, value: Value) -> Result<Params, GroupError> {
    match value {
        Value::Map(values) => Ok(values),
        other => Err(GroupError::Agent {
            address: address.clone(),
            command: command.to_owned(),
            source: AgentError::invalid_argument(format!(
                "logging commands must answer with a map, got {}",
                other.kind()
            )),
        }),
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("names", &self.names)
            .field("selected", &self.selection.iter().map(Vec::len).collect::<Vec<_>>())
            .field("capabilities", &self.capabilities)
            .field("owns_identities", &self.identity.is_some())
            .field("last_command", &self.last_command)
            .finish_non_exhaustive()
    }
}
