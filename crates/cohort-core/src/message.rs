//! Inter-agent messages and the per-call [`Outbox`].
//!
//! Messages queued while a command runs are held back until every agent
//! in the same dispatch has finished computing, then routed to their
//! recipients in sender order.

use crate::id::AgentAddress;
use crate::value::Value;

/// A message from one agent to another.
///
/// # Examples
///
/// ```
/// use cohort_core::{AgentAddress, Message, Value};
///
/// let msg = Message::new(
///     AgentAddress::new("firm", 0u32),
///     AgentAddress::new("household", 3u32),
///     "offer",
///     Value::Float(9.5),
/// );
/// assert_eq!(msg.topic, "offer");
/// assert_eq!(msg.to.id.0, 3);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// The sending agent.
    pub from: AgentAddress,
    /// The addressed recipient.
    pub to: AgentAddress,
    /// Free-form topic used by recipients to sort their inbox.
    pub topic: String,
    /// Message body.
    pub payload: Value,
}

impl Message {
    /// Build a message.
    pub fn new(
        from: AgentAddress,
        to: AgentAddress,
        topic: impl Into<String>,
        payload: impl Into<Value>,
    ) -> Self {
        Self {
            from,
            to,
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Messages queued by one agent during one command invocation.
///
/// The sender address is stamped on every message, so agents only name
/// the recipient.
#[derive(Debug)]
pub struct Outbox {
    sender: AgentAddress,
    queued: Vec<Message>,
}

impl Outbox {
    /// Create an empty outbox for `sender`.
    pub fn new(sender: AgentAddress) -> Self {
        Self {
            sender,
            queued: Vec::new(),
        }
    }

    /// The agent whose messages this outbox collects.
    pub fn sender(&self) -> &AgentAddress {
        &self.sender
    }

    /// Queue a message to `to`.
    pub fn send(&mut self, to: AgentAddress, topic: impl Into<String>, payload: impl Into<Value>) {
        let msg = Message::new(self.sender.clone(), to, topic, payload);
        self.queued.push(msg);
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.queued.len()
    }

    /// Whether nothing has been queued.
    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    /// Take every queued message, in queue order.
    pub fn drain(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.queued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_stamps_sender() {
        let me = AgentAddress::new("firm", 1u32);
        let mut out = Outbox::new(me.clone());
        out.send(AgentAddress::new("household", 2u32), "wage", 10i64);
        let msgs = out.drain();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].from, me);
        assert!(out.is_empty());
    }

    #[test]
    fn drain_preserves_queue_order() {
        let mut out = Outbox::new(AgentAddress::new("a", 0u32));
        for i in 0..3u32 {
            out.send(AgentAddress::new("b", i), "n", i);
        }
        let ids: Vec<u32> = out.drain().iter().map(|m| m.to.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
