//! Common identifier types shared by every TrustNet crate.

use serde::{Deserialize, Serialize};

/// Identifier of a node (and of the device living on it).
///
/// Nodes are small dense integers in every topology we load, so the
/// identifier doubles as the display label and as the ordering key that
/// makes iteration over devices deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Returns the raw index.
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl From<u32> for NodeId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Run-unique identifier of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Returns the identifier following this one.
    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_ordering_follows_index() {
        let mut ids = vec![NodeId(7), NodeId(0), NodeId(3)];
        ids.sort();
        assert_eq!(ids, vec![NodeId(0), NodeId(3), NodeId(7)]);
    }

    #[test]
    fn test_node_id_displays_as_plain_number() {
        assert_eq!(NodeId::from(4).to_string(), "4");
        assert_eq!(MessageId(12).to_string(), "#12");
    }

    #[test]
    fn test_message_id_next() {
        assert_eq!(MessageId(0).next(), MessageId(1));
        assert_eq!(MessageId(u64::MAX).next(), MessageId(0));
    }
}
