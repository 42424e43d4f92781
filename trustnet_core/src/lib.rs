//! TrustNet Core - Trust-Aware Forwarding for MANETs with Black Holes
//!
//! This library decides how a node relays a packet toward a destination it
//! cannot reach directly, in a network where some relays silently discard
//! traffic:
//! 1. **Loops**: bounded simple-path search filtered by the relay history
//! 2. **Black holes**: per-hop greed trials model selfish relays
//! 3. **Relay choice**: pluggable policies, including a softmax over trust

pub mod context;
pub mod device;
pub mod error;
pub mod message;
pub mod metrics;
pub mod routing;
pub mod selector;
pub mod topology;
pub mod trust;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types for convenience
pub use context::ForwardingContext;
pub use device::{Device, Step};
pub use error::TopologyError;
pub use message::{Content, Message};
pub use metrics::{DeliveryCounters, DropBreakdown, Reliability};
pub use routing::{plan_route, DropReason, Route, PATH_SLACK};
pub use selector::{select_next_hop, softmax, ForwardingPolicy};
pub use topology::{NodeSpec, SimplePaths, Topology, TopologySpec};
pub use trust::{TrustFeedback, TrustStore, TRUST_BOUND};
