//! The "TRUST" Engine - per-device reputation of peers.
//!
//! Every device keeps a score for every other node. Scores start neutral
//! at 0 and move with delivery feedback:
//! - A pong coming back rewards the first hop the ping went through
//! - An exchange that ends without a pong penalizes that first hop
//!
//! The selector turns these scores into next-hop probabilities, so a
//! relay that keeps eating packets gets chosen less and less often.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trustnet_env::NodeId;

/// Scores are clamped to `[-TRUST_BOUND, TRUST_BOUND]`.
///
/// Past this magnitude the weighting is already close to deterministic
/// and further growth only delays recovery after behavior changes.
pub const TRUST_BOUND: f64 = 10.0;

/// How delivery outcomes feed back into trust scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TrustFeedback {
    /// Scores never move; trust-weighted selection stays uniform
    Disabled,

    /// Reward the first hop on pong, penalize it when the pong never arrives
    Enabled {
        /// Added on a completed round trip
        reward: f64,
        /// Subtracted on a failed round trip
        penalty: f64,
    },
}

impl TrustFeedback {
    /// Returns true if scores are updated.
    pub fn is_enabled(&self) -> bool {
        matches!(self, TrustFeedback::Enabled { .. })
    }
}

impl Default for TrustFeedback {
    fn default() -> Self {
        TrustFeedback::Enabled {
            reward: 1.0,
            penalty: 1.0,
        }
    }
}

/// Trust scores held by one device.
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    scores: BTreeMap<NodeId, f64>,
}

impl TrustStore {
    /// Creates a store with a neutral score for every peer except `owner`.
    pub fn new(owner: NodeId, peers: impl IntoIterator<Item = NodeId>) -> Self {
        let scores = peers
            .into_iter()
            .filter(|&peer| peer != owner)
            .map(|peer| (peer, 0.0))
            .collect();

        Self { scores }
    }

    /// Score of a peer (0 for peers never seen).
    pub fn score(&self, peer: NodeId) -> f64 {
        self.scores.get(&peer).copied().unwrap_or(0.0)
    }

    /// Scores of `peers`, in the same order.
    pub fn scores_for(&self, peers: &[NodeId]) -> Vec<f64> {
        peers.iter().map(|&peer| self.score(peer)).collect()
    }

    /// Raises a peer's score.
    pub fn reward(&mut self, peer: NodeId, amount: f64) {
        self.adjust(peer, amount.abs());
    }

    /// Lowers a peer's score.
    pub fn penalize(&mut self, peer: NodeId, amount: f64) {
        self.adjust(peer, -amount.abs());
    }

    fn adjust(&mut self, peer: NodeId, delta: f64) {
        let score = self.scores.entry(peer).or_insert(0.0);
        *score = (*score + delta).clamp(-TRUST_BOUND, TRUST_BOUND);
    }

    /// Number of tracked peers.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// All (peer, score) pairs in peer order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.scores.iter().map(|(&peer, &score)| (peer, score))
    }
}
