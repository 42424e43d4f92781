//! Setup errors for the forwarding engine.
//!
//! Routing failures are not errors: a message that cannot be forwarded is
//! dropped and counted (see [`crate::routing::DropReason`]). The variants
//! here only cover malformed input found while building a network.

use thiserror::Error;
use trustnet_env::NodeId;

/// Errors raised while constructing a topology or its devices.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// The same node identifier was declared twice
    #[error("Duplicate node: {0}")]
    DuplicateNode(NodeId),

    /// An edge references a node that was never declared
    #[error("Edge ({0}, {1}) references unknown node {2}")]
    UnknownNode(NodeId, NodeId, NodeId),

    /// An edge connects a node to itself
    #[error("Self-loop on node {0}")]
    SelfLoop(NodeId),

    /// Greed must be a probability
    #[error("Greed {greed} of node {node} is outside [0, 1]")]
    InvalidGreed { node: NodeId, greed: f64 },

    /// Traffic needs at least a source and a distinct destination
    #[error("Topology needs at least 2 nodes, got {0}")]
    TooFewNodes(usize),

    /// Topology description could not be parsed
    #[error("Invalid topology description: {0}")]
    Parse(#[from] serde_json::Error),
}
