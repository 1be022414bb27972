//! Reusable mock agents.
//!
//! - [`NullAgent`]: answers every command with `Unit`, no round hook.
//! - [`RecordingAgent`]: logs every call to a [`Journal`], can message peers.
//! - [`FailingAgent`]: fails deterministically after N calls.
//! - [`CancellingAgent`]: requests cancellation from its round hook.

use cohort_core::{
    Agent, AgentAddress, AgentError, AgentId, CommandContext, Message, Params, RoundHook, RoundId,
    Spawn, Value,
};

use crate::{Event, Journal};

/// Does nothing. Has no round hook.
#[derive(Debug, Default)]
pub struct NullAgent;

impl Agent for NullAgent {
    fn execute(
        &mut self,
        _ctx: &mut CommandContext<'_>,
        _command: &str,
        _args: &[Value],
    ) -> Result<Value, AgentError> {
        Ok(Value::Unit)
    }

    fn receive(&mut self, _message: Message) -> Result<(), AgentError> {
        Ok(())
    }
}

/// Logs every call and answers commands with its own id.
///
/// Commands:
/// - `ping`: sends a `ping` message to every id in `args`, within its own
///   group.
/// - `earn`: adds `args[0]` (default 1.0) to `wealth`.
/// - `last`: returns the dispatching group's last command as text.
/// - anything else: logged only.
///
/// Init params: `wealth` (number) seeds `wealth`; `fail_init: true` makes
/// `init` fail. Fixed params: `tag` is exposed as an attribute. Received
/// message topics are kept as the `topics` list attribute.
#[derive(Debug)]
pub struct RecordingAgent {
    pub address: AgentAddress,
    journal: Journal,
    pub wealth: f64,
    pub calls: i64,
    pub inbox: i64,
    pub topics: Vec<String>,
    tag: Option<Value>,
}

impl RecordingAgent {
    pub fn new(address: AgentAddress, journal: Journal) -> Self {
        Self {
            address,
            journal,
            wealth: 0.0,
            calls: 0,
            inbox: 0,
            topics: Vec::new(),
            tag: None,
        }
    }

    /// Build from a factory call, keeping the fixed `tag` parameter.
    pub fn from_spawn(spawn: Spawn<'_>, journal: Journal) -> Self {
        let mut agent = Self::new(spawn.address(), journal);
        agent.tag = spawn.fixed.get("tag").cloned();
        agent
    }
}

impl Agent for RecordingAgent {
    fn init(&mut self, params: &Params) -> Result<(), AgentError> {
        if params.get("fail_init").and_then(Value::as_bool) == Some(true) {
            return Err(AgentError::failed("init refused"));
        }
        self.wealth = params.get("wealth").and_then(Value::as_f64).unwrap_or(0.0);
        Ok(())
    }

    fn execute(
        &mut self,
        ctx: &mut CommandContext<'_>,
        command: &str,
        args: &[Value],
    ) -> Result<Value, AgentError> {
        self.journal.record(Event::Execute {
            address: self.address.clone(),
            command: command.to_owned(),
        });
        self.calls += 1;
        match command {
            "ping" => {
                for arg in args {
                    let id = arg.as_i64().ok_or_else(|| {
                        AgentError::invalid_argument(format!("ping target must be an id, got {}", arg.kind()))
                    })?;
                    let to = AgentAddress {
                        group: self.address.group.clone(),
                        id: AgentId(id as u32),
                    };
                    ctx.send(to, "ping", i64::from(self.address.id.0));
                }
            }
            "earn" => {
                self.wealth += args.first().and_then(Value::as_f64).unwrap_or(1.0);
            }
            "last" => return Ok(Value::Text(ctx.last_command().to_owned())),
            _ => {}
        }
        Ok(Value::Int(i64::from(self.address.id.0)))
    }

    fn receive(&mut self, message: Message) -> Result<(), AgentError> {
        self.topics.push(message.topic.clone());
        self.journal.record(Event::Receive {
            to: self.address.clone(),
            from: message.from,
            topic: message.topic,
        });
        self.inbox += 1;
        Ok(())
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::Int(i64::from(self.address.id.0))),
            "wealth" => Some(Value::Float(self.wealth)),
            "calls" => Some(Value::Int(self.calls)),
            "inbox" => Some(Value::Int(self.inbox)),
            "topics" => Some(Value::from(self.topics.clone())),
            "tag" => self.tag.clone(),
            _ => None,
        }
    }

    fn round_hook(&mut self) -> Option<&mut dyn RoundHook> {
        Some(self)
    }
}

impl RoundHook for RecordingAgent {
    fn advance_round(&mut self, round: RoundId) -> Result<(), AgentError> {
        self.journal.record(Event::Advance {
            address: self.address.clone(),
            round,
        });
        Ok(())
    }
}

/// Succeeds `succeed_count` calls, then fails every call after.
///
/// Command calls and round-hook calls share one counter.
#[derive(Debug)]
pub struct FailingAgent {
    pub address: AgentAddress,
    journal: Journal,
    pub succeed_count: usize,
    calls: usize,
}

impl FailingAgent {
    pub fn new(address: AgentAddress, journal: Journal, succeed_count: usize) -> Self {
        Self {
            address,
            journal,
            succeed_count,
            calls: 0,
        }
    }

    /// How many calls have been attempted.
    pub fn calls(&self) -> usize {
        self.calls
    }

    fn attempt(&mut self) -> Result<(), AgentError> {
        let n = self.calls;
        self.calls += 1;
        if n >= self.succeed_count {
            return Err(AgentError::failed(format!(
                "deliberate failure after {} successful calls",
                self.succeed_count
            )));
        }
        Ok(())
    }
}

impl Agent for FailingAgent {
    fn execute(
        &mut self,
        _ctx: &mut CommandContext<'_>,
        command: &str,
        _args: &[Value],
    ) -> Result<Value, AgentError> {
        self.journal.record(Event::Execute {
            address: self.address.clone(),
            command: command.to_owned(),
        });
        self.attempt()?;
        Ok(Value::Int(i64::from(self.address.id.0)))
    }

    fn receive(&mut self, _message: Message) -> Result<(), AgentError> {
        Ok(())
    }

    fn round_hook(&mut self) -> Option<&mut dyn RoundHook> {
        Some(self)
    }
}

impl RoundHook for FailingAgent {
    fn advance_round(&mut self, round: RoundId) -> Result<(), AgentError> {
        self.journal.record(Event::Advance {
            address: self.address.clone(),
            round,
        });
        self.attempt()
    }
}

/// Asks the round sweep to stop from inside its hook.
#[derive(Debug)]
pub struct CancellingAgent {
    pub address: AgentAddress,
    journal: Journal,
}

impl CancellingAgent {
    pub fn new(address: AgentAddress, journal: Journal) -> Self {
        Self { address, journal }
    }
}

impl Agent for CancellingAgent {
    fn execute(
        &mut self,
        _ctx: &mut CommandContext<'_>,
        _command: &str,
        _args: &[Value],
    ) -> Result<Value, AgentError> {
        Ok(Value::Unit)
    }

    fn receive(&mut self, _message: Message) -> Result<(), AgentError> {
        Ok(())
    }

    fn round_hook(&mut self) -> Option<&mut dyn RoundHook> {
        Some(self)
    }
}

impl RoundHook for CancellingAgent {
    fn advance_round(&mut self, round: RoundId) -> Result<(), AgentError> {
        self.journal.record(Event::Advance {
            address: self.address.clone(),
            round,
        });
        Err(AgentError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohort_core::Outbox;

    #[test]
    fn failing_agent_fails_after_budget() {
        let mut agent = FailingAgent::new(AgentAddress::new("g", 0u32), Journal::new(), 1);
        let mut out = Outbox::new(agent.address.clone());
        let mut ctx = CommandContext::new("", RoundId(0), &mut out);
        assert!(agent.execute(&mut ctx, "step", &[]).is_ok());
        assert!(agent.execute(&mut ctx, "step", &[]).is_err());
        assert_eq!(agent.calls(), 2);
    }

    #[test]
    fn recording_agent_pings_peers() {
        let address = AgentAddress::new("g", 2u32);
        let mut agent = RecordingAgent::new(address.clone(), Journal::new());
        let mut out = Outbox::new(address);
        let mut ctx = CommandContext::new("", RoundId(0), &mut out);
        let v = agent
            .execute(&mut ctx, "ping", &[Value::Int(0), Value::Int(1)])
            .unwrap();
        assert_eq!(v, Value::Int(2));
        let sent = out.drain();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].to, AgentAddress::new("g", 1u32));
    }

    #[test]
    fn init_reads_wealth_and_can_refuse() {
        let mut agent = RecordingAgent::new(AgentAddress::new("g", 0u32), Journal::new());
        let mut params = Params::new();
        params.insert("wealth".into(), Value::Float(2.5));
        agent.init(&params).unwrap();
        assert_eq!(agent.wealth, 2.5);

        params.insert("fail_init".into(), Value::Bool(true));
        assert!(agent.init(&params).is_err());
    }
}
