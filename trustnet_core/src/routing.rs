//! Route planning - direct delivery, bounded path search, loop filtering.

use crate::message::Message;
use crate::topology::Topology;
use serde::{Deserialize, Serialize};
use trustnet_env::NodeId;

/// Slack added to the shortest distance when enumerating candidate paths.
///
/// Path enumeration is exponential in this bound; it stays fixed.
pub const PATH_SLACK: usize = 3;

/// Why a message stopped before reaching its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// A relay selfishly discarded the packet (black holes always do)
    Greed,

    /// Every path within the cutoff re-enters a node that already relayed it
    NoRoute,

    /// Source and destination lie in different components
    Disconnected,

    /// The scheduler's hop limit was reached
    HopLimit,
}

impl DropReason {
    /// Returns every reason.
    pub fn all() -> [DropReason; 4] {
        [
            DropReason::Greed,
            DropReason::NoRoute,
            DropReason::Disconnected,
            DropReason::HopLimit,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            DropReason::Greed => "greed",
            DropReason::NoRoute => "no_route",
            DropReason::Disconnected => "disconnected",
            DropReason::HopLimit => "hop_limit",
        }
    }
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of planning a hop.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// The destination is a neighbor
    Direct(NodeId),

    /// Loop-free candidate paths, each starting at the planning node
    Candidates(Vec<Vec<NodeId>>),
}

/// Plans the next hop of `message` at node `at`.
///
/// 1. A neighboring destination is always delivered to directly.
/// 2. Otherwise every simple path of at most `d + PATH_SLACK` edges is
///    enumerated, `d` being the shortest distance to the destination.
/// 3. Paths through any node already in the message's history are
///    discarded, so a message never revisits a relay.
pub fn plan_route(topology: &Topology, at: NodeId, message: &Message) -> Result<Route, DropReason> {
    let dst = message.dst();

    if topology.is_adjacent(at, dst) {
        return Ok(Route::Direct(dst));
    }

    let distance = topology
        .shortest_distance(at, dst)
        .ok_or(DropReason::Disconnected)?;

    let candidates: Vec<Vec<NodeId>> = topology
        .simple_paths(at, dst, distance + PATH_SLACK)
        .filter(|path| !message.has_cycles_in(path))
        .collect();

    if candidates.is_empty() {
        return Err(DropReason::NoRoute);
    }

    Ok(Route::Candidates(candidates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::TopologySpec;
    use trustnet_env::MessageId;

    fn ring(n: u32) -> Topology {
        let mut spec = TopologySpec::new();
        for i in 0..n {
            spec = spec.node(i, 0.0).edge(i, (i + 1) % n);
        }
        spec.build().unwrap()
    }

    #[test]
    fn test_direct_delivery_wins() {
        let topo = ring(5);
        let msg = Message::ping(MessageId(0), NodeId(0), NodeId(1));
        assert_eq!(plan_route(&topo, NodeId(0), &msg), Ok(Route::Direct(NodeId(1))));
    }

    #[test]
    fn test_candidates_both_ways_round_ring() {
        let topo = ring(6);
        let msg = Message::ping(MessageId(0), NodeId(0), NodeId(3));

        let Ok(Route::Candidates(paths)) = plan_route(&topo, NodeId(0), &msg) else {
            panic!("expected candidates");
        };
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.len() == 4));
    }

    #[test]
    fn test_history_filters_paths() {
        let topo = ring(6);
        let mut msg = Message::ping(MessageId(0), NodeId(0), NodeId(3));
        msg.postmark(NodeId(0));

        // At node 1 the only candidate is 1-2-3; going back through 0 is a cycle
        let Ok(Route::Candidates(paths)) = plan_route(&topo, NodeId(1), &msg) else {
            panic!("expected candidates");
        };
        assert_eq!(paths, vec![vec![NodeId(1), NodeId(2), NodeId(3)]]);
    }

    #[test]
    fn test_no_route_when_history_blocks_everything() {
        let topo = TopologySpec::with_black_holes(4, &[], &[(0, 1), (1, 2), (2, 3)])
            .build()
            .unwrap();
        let mut msg = Message::ping(MessageId(0), NodeId(0), NodeId(3));
        msg.postmark(NodeId(2));

        assert_eq!(plan_route(&topo, NodeId(1), &msg), Err(DropReason::NoRoute));
    }

    #[test]
    fn test_disconnected() {
        let topo = TopologySpec::with_black_holes(4, &[], &[(0, 1), (1, 2)])
            .build()
            .unwrap();
        let msg = Message::ping(MessageId(0), NodeId(0), NodeId(3));
        assert_eq!(plan_route(&topo, NodeId(0), &msg), Err(DropReason::Disconnected));
    }
}
