//! The network graph - adjacency, hop distance and bounded path search.
//!
//! Every device is assumed to know the full topology (a simplification
//! over real MANETs, where knowledge is partial). The graph is built once
//! from a [`TopologySpec`] and is read-only for the rest of a run.

use crate::error::TopologyError;
use serde::{Deserialize, Serialize};
use std::collections::{btree_set, BTreeMap, BTreeSet, VecDeque};
use trustnet_env::NodeId;

static NO_NEIGHBORS: BTreeSet<NodeId> = BTreeSet::new();

/// An undirected, unweighted network graph.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// Adjacency sets, ordered so every traversal is deterministic
    adjacency: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl Topology {
    /// Creates an empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node. Returns false if it already existed.
    pub fn add_node(&mut self, id: NodeId) -> bool {
        if self.adjacency.contains_key(&id) {
            return false;
        }
        self.adjacency.insert(id, BTreeSet::new());
        true
    }

    /// Adds an undirected edge between two existing nodes.
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> Result<(), TopologyError> {
        if a == b {
            return Err(TopologyError::SelfLoop(a));
        }
        for node in [a, b] {
            if !self.contains(node) {
                return Err(TopologyError::UnknownNode(a, b, node));
            }
        }

        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
        Ok(())
    }

    /// Returns true if the node exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.adjacency.contains_key(&id)
    }

    /// Returns all node identifiers in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency.keys().copied()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Neighbors of a node in ascending order (empty for unknown nodes).
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.neighbor_iter(id).copied()
    }

    fn neighbor_iter(&self, id: NodeId) -> btree_set::Iter<'_, NodeId> {
        self.adjacency.get(&id).unwrap_or(&NO_NEIGHBORS).iter()
    }

    /// Checks if two nodes share an edge.
    pub fn is_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.adjacency
            .get(&a)
            .map(|neighbors| neighbors.contains(&b))
            .unwrap_or(false)
    }

    /// Hop count of the shortest path from `from` to `to`.
    ///
    /// Returns `None` when either node is unknown or the two nodes lie in
    /// different connected components.
    pub fn shortest_distance(&self, from: NodeId, to: NodeId) -> Option<usize> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        if from == to {
            return Some(0);
        }

        let mut seen = BTreeSet::from([from]);
        let mut frontier = VecDeque::from([(from, 0usize)]);

        while let Some((node, depth)) = frontier.pop_front() {
            for next in self.neighbors(node) {
                if next == to {
                    return Some(depth + 1);
                }
                if seen.insert(next) {
                    frontier.push_back((next, depth + 1));
                }
            }
        }

        None
    }

    /// Lazily enumerates simple paths from `from` to `to`.
    ///
    /// Each path starts with `from`, ends with `to`, visits no node twice
    /// and has at most `max_length` edges. Paths come out in depth-first
    /// order over ascending neighbor ids. The search cost grows
    /// exponentially with `max_length`, so callers bound it tightly.
    pub fn simple_paths(&self, from: NodeId, to: NodeId, max_length: usize) -> SimplePaths<'_> {
        let searchable = max_length >= 1 && from != to && self.contains(from) && self.contains(to);

        let (visited, stack) = if searchable {
            (vec![from], vec![self.neighbor_iter(from)])
        } else {
            (Vec::new(), Vec::new())
        };

        SimplePaths {
            topology: self,
            target: to,
            cutoff: max_length,
            visited,
            stack,
        }
    }
}

/// Iterator over bounded simple paths, see [`Topology::simple_paths`].
///
/// Finite and single-use: once exhausted it stays exhausted.
pub struct SimplePaths<'a> {
    topology: &'a Topology,
    target: NodeId,
    cutoff: usize,
    /// Current partial path, starting at the source
    visited: Vec<NodeId>,
    /// Unexplored neighbors for every node on the partial path
    stack: Vec<btree_set::Iter<'a, NodeId>>,
}

impl<'a> Iterator for SimplePaths<'a> {
    type Item = Vec<NodeId>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(children) = self.stack.last_mut() {
            match children.next().copied() {
                None => {
                    self.stack.pop();
                    self.visited.pop();
                }
                Some(child) if self.visited.len() < self.cutoff => {
                    if self.visited.contains(&child) {
                        continue;
                    }
                    if child == self.target {
                        let mut path = self.visited.clone();
                        path.push(child);
                        return Some(path);
                    }
                    self.visited.push(child);
                    self.stack.push(self.topology.neighbor_iter(child));
                }
                Some(child) => {
                    // At the cutoff only a direct hop onto the target completes a path
                    let target = self.target;
                    let reaches = child == target || children.any(|&c| c == target);
                    let path = reaches.then(|| {
                        let mut path = self.visited.clone();
                        path.push(target);
                        path
                    });

                    self.stack.pop();
                    self.visited.pop();

                    if path.is_some() {
                        return path;
                    }
                }
            }
        }

        None
    }
}

/// A node declaration in a topology description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Node identifier
    pub id: NodeId,

    /// Probability of selfishly dropping a relayed packet (1.0 = black hole)
    #[serde(default)]
    pub greed: f64,
}

/// Serializable description of a network: nodes with greed plus edges.
///
/// ```json
/// { "nodes": [{ "id": 0, "greed": 0.0 }, { "id": 1, "greed": 1.0 }],
///   "edges": [[0, 1]] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologySpec {
    /// Declared nodes
    pub nodes: Vec<NodeSpec>,

    /// Undirected edges
    #[serde(default)]
    pub edges: Vec<(NodeId, NodeId)>,
}

impl TopologySpec {
    /// Creates an empty description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a description of nodes `0..count`, where `black_holes` get
    /// greed 1 and every other node greed 0.
    pub fn with_black_holes(count: u32, black_holes: &[u32], edges: &[(u32, u32)]) -> Self {
        let nodes = (0..count)
            .map(|i| NodeSpec {
                id: NodeId(i),
                greed: if black_holes.contains(&i) { 1.0 } else { 0.0 },
            })
            .collect();

        Self {
            nodes,
            edges: edges.iter().map(|&(a, b)| (NodeId(a), NodeId(b))).collect(),
        }
    }

    /// Adds a node declaration.
    pub fn node(mut self, id: u32, greed: f64) -> Self {
        self.nodes.push(NodeSpec { id: NodeId(id), greed });
        self
    }

    /// Adds an edge.
    pub fn edge(mut self, a: u32, b: u32) -> Self {
        self.edges.push((NodeId(a), NodeId(b)));
        self
    }

    /// Parses a JSON description.
    pub fn from_json(json: &str) -> Result<Self, TopologyError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Greed declared for a node, if the node exists.
    pub fn greed_of(&self, id: NodeId) -> Option<f64> {
        self.nodes.iter().find(|n| n.id == id).map(|n| n.greed)
    }

    /// Nodes that never forward (greed of 1).
    pub fn black_holes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.greed >= 1.0)
            .map(|n| n.id)
            .collect()
    }

    /// Validates the description and builds the graph.
    pub fn build(&self) -> Result<Topology, TopologyError> {
        if self.nodes.len() < 2 {
            return Err(TopologyError::TooFewNodes(self.nodes.len()));
        }

        let mut topology = Topology::new();
        for node in &self.nodes {
            if !(0.0..=1.0).contains(&node.greed) {
                return Err(TopologyError::InvalidGreed {
                    node: node.id,
                    greed: node.greed,
                });
            }
            if !topology.add_node(node.id) {
                return Err(TopologyError::DuplicateNode(node.id));
            }
        }

        for &(a, b) in &self.edges {
            topology.connect(a, b)?;
        }

        Ok(topology)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: u32) -> Topology {
        let mut spec = TopologySpec::new();
        for i in 0..n {
            spec = spec.node(i, 0.0);
        }
        for i in 1..n {
            spec = spec.edge(i - 1, i);
        }
        spec.build().unwrap()
    }

    fn complete(n: u32) -> Topology {
        let mut spec = TopologySpec::new();
        for i in 0..n {
            spec = spec.node(i, 0.0);
        }
        for a in 0..n {
            for b in (a + 1)..n {
                spec = spec.edge(a, b);
            }
        }
        spec.build().unwrap()
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let topo = line(3);
        assert!(topo.is_adjacent(NodeId(0), NodeId(1)));
        assert!(topo.is_adjacent(NodeId(1), NodeId(0)));
        assert!(!topo.is_adjacent(NodeId(0), NodeId(2)));
        assert!(!topo.is_adjacent(NodeId(0), NodeId(9)));
        assert_eq!(topo.edge_count(), 2);
    }

    #[test]
    fn test_shortest_distance() {
        let topo = line(5);
        assert_eq!(topo.shortest_distance(NodeId(0), NodeId(0)), Some(0));
        assert_eq!(topo.shortest_distance(NodeId(0), NodeId(1)), Some(1));
        assert_eq!(topo.shortest_distance(NodeId(0), NodeId(4)), Some(4));
        assert_eq!(topo.shortest_distance(NodeId(4), NodeId(1)), Some(3));
    }

    #[test]
    fn test_shortest_distance_disconnected() {
        let topo = TopologySpec::new()
            .node(0, 0.0)
            .node(1, 0.0)
            .node(2, 0.0)
            .edge(0, 1)
            .build()
            .unwrap();

        assert_eq!(topo.shortest_distance(NodeId(0), NodeId(2)), None);
        assert_eq!(topo.shortest_distance(NodeId(0), NodeId(7)), None);
    }

    #[test]
    fn test_simple_paths_on_line() {
        let topo = line(3);
        let paths: Vec<_> = topo.simple_paths(NodeId(0), NodeId(2), 5).collect();
        assert_eq!(paths, vec![vec![NodeId(0), NodeId(1), NodeId(2)]]);
    }

    #[test]
    fn test_simple_paths_respect_cutoff() {
        // K4 from 0 to 3: direct, two 2-hop detours, two 3-hop detours
        let topo = complete(4);
        assert_eq!(topo.simple_paths(NodeId(0), NodeId(3), 1).count(), 1);
        assert_eq!(topo.simple_paths(NodeId(0), NodeId(3), 2).count(), 3);
        assert_eq!(topo.simple_paths(NodeId(0), NodeId(3), 3).count(), 5);
        assert_eq!(topo.simple_paths(NodeId(0), NodeId(3), 10).count(), 5);
    }

    #[test]
    fn test_simple_paths_are_simple_and_bounded() {
        let topo = complete(6);
        for path in topo.simple_paths(NodeId(0), NodeId(5), 3) {
            assert_eq!(path.first(), Some(&NodeId(0)));
            assert_eq!(path.last(), Some(&NodeId(5)));
            assert!(path.len() - 1 <= 3);

            let unique: BTreeSet<_> = path.iter().collect();
            assert_eq!(unique.len(), path.len());

            for hop in path.windows(2) {
                assert!(topo.is_adjacent(hop[0], hop[1]));
            }
        }
    }

    #[test]
    fn test_simple_paths_degenerate_queries() {
        let topo = line(3);
        assert_eq!(topo.simple_paths(NodeId(0), NodeId(0), 5).count(), 0);
        assert_eq!(topo.simple_paths(NodeId(0), NodeId(2), 0).count(), 0);
        assert_eq!(topo.simple_paths(NodeId(0), NodeId(2), 1).count(), 0);
        assert_eq!(topo.simple_paths(NodeId(0), NodeId(42), 5).count(), 0);
    }

    #[test]
    fn test_simple_paths_are_lazy() {
        let topo = complete(9);
        let mut paths = topo.simple_paths(NodeId(0), NodeId(8), 8);
        // First path in DFS order goes straight through the lowest ids
        assert_eq!(paths.next().map(|p| p.len()), Some(9));
        assert!(paths.next().is_some());
    }

    #[test]
    fn test_spec_rejects_bad_input() {
        let dup = TopologySpec::new().node(0, 0.0).node(0, 0.0);
        assert!(matches!(dup.build(), Err(TopologyError::DuplicateNode(NodeId(0)))));

        let unknown = TopologySpec::new().node(0, 0.0).node(1, 0.0).edge(0, 5);
        assert!(matches!(unknown.build(), Err(TopologyError::UnknownNode(_, _, NodeId(5)))));

        let looped = TopologySpec::new().node(0, 0.0).node(1, 0.0).edge(1, 1);
        assert!(matches!(looped.build(), Err(TopologyError::SelfLoop(NodeId(1)))));

        let greedy = TopologySpec::new().node(0, 0.0).node(1, 1.5);
        assert!(matches!(greedy.build(), Err(TopologyError::InvalidGreed { .. })));

        let nan = TopologySpec::new().node(0, f64::NAN).node(1, 0.0);
        assert!(matches!(nan.build(), Err(TopologyError::InvalidGreed { .. })));

        let lonely = TopologySpec::new().node(0, 0.0);
        assert!(matches!(lonely.build(), Err(TopologyError::TooFewNodes(1))));
    }

    #[test]
    fn test_spec_from_json() {
        let json = r#"{
            "nodes": [{ "id": 0 }, { "id": 1, "greed": 1.0 }, { "id": 2, "greed": 0.25 }],
            "edges": [[0, 1], [1, 2]]
        }"#;

        let spec = TopologySpec::from_json(json).unwrap();
        assert_eq!(spec.greed_of(NodeId(0)), Some(0.0));
        assert_eq!(spec.greed_of(NodeId(2)), Some(0.25));
        assert_eq!(spec.black_holes(), vec![NodeId(1)]);

        let topo = spec.build().unwrap();
        assert_eq!(topo.node_count(), 3);
        assert!(topo.is_adjacent(NodeId(2), NodeId(1)));
    }

    #[test]
    fn test_spec_from_json_rejects_garbage() {
        assert!(matches!(TopologySpec::from_json("{ nodes: }"), Err(TopologyError::Parse(_))));
    }
}
