//! Messages exchanged between devices.

use serde::{Deserialize, Serialize};
use trustnet_env::{MessageId, NodeId};

/// What a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Content {
    /// Request produced by a device toward a random destination
    Ping,

    /// Acknowledgment sent back by the ping's destination
    Pong,
}

impl std::fmt::Display for Content {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Content::Ping => write!(f, "ping"),
            Content::Pong => write!(f, "pong"),
        }
    }
}

/// A packet travelling through the network.
///
/// Only the relay history changes while a message is in flight. Once it is
/// delivered or dropped nothing touches it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    src: NodeId,
    dst: NodeId,
    content: Content,
    /// For a pong, the ping it answers
    in_reply_to: Option<MessageId>,
    /// Devices that relayed this message, in relay order
    history: Vec<NodeId>,
}

impl Message {
    /// Creates a ping from `src` to `dst`.
    pub fn ping(id: MessageId, src: NodeId, dst: NodeId) -> Self {
        debug_assert_ne!(src, dst, "a ping never targets its own origin");
        Self {
            id,
            src,
            dst,
            content: Content::Ping,
            in_reply_to: None,
            history: Vec::new(),
        }
    }

    /// Creates the pong answering `ping`, addressed back to its source.
    pub fn pong(id: MessageId, ping: &Message) -> Self {
        Self {
            id,
            src: ping.dst,
            dst: ping.src,
            content: Content::Pong,
            in_reply_to: Some(ping.id),
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn src(&self) -> NodeId {
        self.src
    }

    pub fn dst(&self) -> NodeId {
        self.dst
    }

    pub fn content(&self) -> Content {
        self.content
    }

    pub fn in_reply_to(&self) -> Option<MessageId> {
        self.in_reply_to
    }

    /// Relay history, oldest first.
    pub fn history(&self) -> &[NodeId] {
        &self.history
    }

    /// Number of relays so far.
    pub fn hops(&self) -> usize {
        self.history.len()
    }

    /// Marks the message as relayed by `node`.
    pub fn postmark(&mut self, node: NodeId) {
        self.history.push(node);
    }

    /// Reports whether any node of `path` already relayed this message.
    pub fn has_cycles_in(&self, path: &[NodeId]) -> bool {
        path.iter().any(|node| self.history.contains(node))
    }
}
