//! The [`Agent`] trait, its optional [`RoundHook`], and the [`AgentClass`]
//! descriptor that groups use to construct agents and resolve capabilities.

use std::fmt;
use std::sync::Arc;

use crate::capability::CapabilitySet;
use crate::error::AgentError;
use crate::id::{AgentAddress, AgentId, GroupName, RoundId};
use crate::message::{Message, Outbox};
use crate::value::{Params, Value};

/// Reserved command answered by every agent with a panel of attributes.
pub const PANEL_LOG_COMMAND: &str = "_panel_log";

/// Reserved command answered by every agent with attributes for aggregation.
pub const AGG_LOG_COMMAND: &str = "_agg_log";

/// Key prefix for the length entries of a logging answer.
pub const LOG_LENGTH_PREFIX: &str = "len_";

/// Whether `command` is one of the reserved logging commands.
pub fn is_logging_command(command: &str) -> bool {
    command == PANEL_LOG_COMMAND || command == AGG_LOG_COMMAND
}

/// Per-call context handed to [`Agent::execute`].
pub struct CommandContext<'a> {
    last_command: &'a str,
    round: RoundId,
    outbox: &'a mut Outbox,
}

impl<'a> CommandContext<'a> {
    /// Create a context. Called by the dispatcher once per agent per call.
    pub fn new(last_command: &'a str, round: RoundId, outbox: &'a mut Outbox) -> Self {
        Self {
            last_command,
            round,
            outbox,
        }
    }

    /// Address of the agent being called.
    pub fn address(&self) -> &AgentAddress {
        self.outbox.sender()
    }

    /// The most recent user command forwarded by the dispatching group.
    pub fn last_command(&self) -> &str {
        self.last_command
    }

    /// The last round the dispatching group advanced to.
    pub fn round(&self) -> RoundId {
        self.round
    }

    /// Queue a message for delivery after every agent in this dispatch
    /// has finished computing.
    pub fn send(&mut self, to: AgentAddress, topic: impl Into<String>, payload: impl Into<Value>) {
        self.outbox.send(to, topic, payload);
    }
}

/// An independently stateful simulation entity.
///
/// # Contract
///
/// - [`init()`](Agent::init) runs exactly once, right after construction.
/// - [`execute()`](Agent::execute) is called only with commands declared by
///   the agent's [`AgentClass`]; messages it queues are delivered only after
///   every agent in the same dispatch has returned.
/// - [`receive()`](Agent::receive) is called during the delivery pass of a
///   dispatch, never concurrently with `execute()` on the same agent.
///
/// # Examples
///
/// ```
/// use cohort_core::{Agent, AgentError, CommandContext, Message, Value};
///
/// struct Counter { n: i64, inbox: Vec<Message> }
///
/// impl Agent for Counter {
///     fn execute(
///         &mut self,
///         _ctx: &mut CommandContext<'_>,
///         command: &str,
///         _args: &[Value],
///     ) -> Result<Value, AgentError> {
///         match command {
///             "step" => { self.n += 1; Ok(Value::Int(self.n)) }
///             other => Err(AgentError::unknown_command(other)),
///         }
///     }
///
///     fn receive(&mut self, message: Message) -> Result<(), AgentError> {
///         self.inbox.push(message);
///         Ok(())
///     }
/// }
/// ```
pub trait Agent: Send + 'static {
    /// One-time initializer, called with the construction parameters.
    ///
    /// Default: no-op.
    fn init(&mut self, params: &Params) -> Result<(), AgentError> {
        let _ = params;
        Ok(())
    }

    /// Run one named command.
    fn execute(
        &mut self,
        ctx: &mut CommandContext<'_>,
        command: &str,
        args: &[Value],
    ) -> Result<Value, AgentError>;

    /// Accept a message delivered by the store.
    fn receive(&mut self, message: Message) -> Result<(), AgentError>;

    /// Read a named variable or possession for the logging commands.
    ///
    /// Default: no attributes.
    fn attribute(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }

    /// The optional end-of-round capability.
    ///
    /// Agents with round-end behaviour return `Some(self)`. Default: `None`.
    fn round_hook(&mut self) -> Option<&mut dyn RoundHook> {
        None
    }

    /// Entry point used by the dispatcher.
    ///
    /// Answers the reserved logging commands from [`attribute()`](Agent::attribute)
    /// and forwards everything else to [`execute()`](Agent::execute).
    ///
    /// A logging command takes up to three name lists: variables,
    /// possessions, and attributes whose length is recorded under
    /// [`LOG_LENGTH_PREFIX`] plus the name. Only list and map attributes
    /// have a length.
    fn handle(
        &mut self,
        ctx: &mut CommandContext<'_>,
        command: &str,
        args: &[Value],
    ) -> Result<Value, AgentError> {
        if is_logging_command(command) {
            let (attributes, lengths) = args.split_at(args.len().min(2));
            let lookup = |name: &str| {
                self.attribute(name).ok_or_else(|| {
                    AgentError::invalid_argument(format!("unknown attribute '{name}'"))
                })
            };
            let mut record = Params::new();
            for name in logged_names(attributes) {
                let name = name?;
                record.insert(name.to_owned(), lookup(name)?);
            }
            for name in logged_names(lengths) {
                let name = name?;
                let len = match lookup(name)? {
                    Value::List(items) => items.len(),
                    Value::Map(entries) => entries.len(),
                    other => {
                        return Err(AgentError::invalid_argument(format!(
                            "attribute '{name}' has no length, it is {}",
                            other.kind()
                        )))
                    }
                };
                let len = i64::try_from(len).unwrap_or(i64::MAX);
                record.insert(format!("{LOG_LENGTH_PREFIX}{name}"), Value::Int(len));
            }
            return Ok(Value::Map(record));
        }
        self.execute(ctx, command, args)
    }
}

/// Attribute names from the list arguments of a logging command.
fn logged_names(lists: &[Value]) -> impl Iterator<Item = Result<&str, AgentError>> + '_ {
    lists.iter().filter_map(Value::as_list).flatten().map(|name| {
        name.as_str().ok_or_else(|| {
            AgentError::invalid_argument(format!(
                "attribute names must be text, got {}",
                name.kind()
            ))
        })
    })
}

/// End-of-round behaviour, exposed through [`Agent::round_hook`].
pub trait RoundHook {
    /// Called once per round sweep with the round being closed.
    fn advance_round(&mut self, round: RoundId) -> Result<(), AgentError>;
}

/// Everything a factory needs to construct one agent.
#[derive(Clone, Copy, Debug)]
pub struct Spawn<'a> {
    /// The slot the agent will occupy.
    pub id: AgentId,
    /// The collection the agent belongs to.
    pub group: &'a GroupName,
    /// Per-agent construction parameters.
    pub params: &'a Params,
    /// Extra parameters the group passes to every agent it creates.
    pub fixed: &'a Params,
}

impl Spawn<'_> {
    /// The new agent's address.
    pub fn address(&self) -> AgentAddress {
        AgentAddress {
            group: self.group.clone(),
            id: self.id,
        }
    }
}

type Factory = dyn Fn(Spawn<'_>) -> Box<dyn Agent> + Send + Sync;

/// Descriptor for one agent type.
///
/// Declares the commands the type answers and how to build an instance.
/// Cloning is cheap; the factory is shared.
#[derive(Clone)]
pub struct AgentClass {
    kind: String,
    commands: CapabilitySet,
    factory: Arc<Factory>,
}

impl AgentClass {
    /// Create a class from a kind name, its declared commands, and a factory.
    ///
    /// The initializer and underscore-prefixed names are dropped from
    /// `commands`.
    pub fn new<I, S, F>(kind: impl Into<String>, commands: I, factory: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Spawn<'_>) -> Box<dyn Agent> + Send + Sync + 'static,
    {
        Self {
            kind: kind.into(),
            commands: commands.into_iter().collect(),
            factory: Arc::new(factory),
        }
    }

    /// Human-readable type name for errors and logs.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Commands this type declares.
    pub fn commands(&self) -> &CapabilitySet {
        &self.commands
    }

    /// Construct an agent. Does not call [`Agent::init`].
    pub fn spawn(&self, spawn: Spawn<'_>) -> Box<dyn Agent> {
        (self.factory)(spawn)
    }
}

impl fmt::Debug for AgentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentClass")
            .field("kind", &self.kind)
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}
