//! Next-hop selection strategies.
//!
//! A device that cannot reach the destination directly hands its candidate
//! paths to the selector, which picks the neighbor to relay through.

use crate::trust::{TrustFeedback, TrustStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use trustnet_env::{NodeId, RandomSource};

/// Forwarding policy of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardingPolicy {
    /// Pick a candidate path uniformly at random and follow it
    Uniform,

    /// Only consider the shortest candidate paths, spending as few relays
    /// as possible on someone else's packet
    Greedy,

    /// Weight each distinct next hop by the softmax of its trust score
    TrustWeighted,
}

impl ForwardingPolicy {
    /// Returns every policy.
    pub fn all() -> Vec<ForwardingPolicy> {
        vec![
            ForwardingPolicy::Uniform,
            ForwardingPolicy::Greedy,
            ForwardingPolicy::TrustWeighted,
        ]
    }

    /// Returns the policy name.
    pub fn name(&self) -> &'static str {
        match self {
            ForwardingPolicy::Uniform => "uniform",
            ForwardingPolicy::Greedy => "greedy",
            ForwardingPolicy::TrustWeighted => "trust",
        }
    }

    /// Returns a description of the policy.
    pub fn description(&self) -> &'static str {
        match self {
            ForwardingPolicy::Uniform => "Unconditional relay along a random loop-free path",
            ForwardingPolicy::Greedy => "Self-interested relay along the shortest loop-free paths",
            ForwardingPolicy::TrustWeighted => "Softmax over per-peer trust scores",
        }
    }

    /// Feedback used when the caller does not choose one.
    ///
    /// Only the trust-weighted policy reads scores, so the others skip
    /// the bookkeeping.
    pub fn default_feedback(&self) -> TrustFeedback {
        match self {
            ForwardingPolicy::TrustWeighted => TrustFeedback::default(),
            _ => TrustFeedback::Disabled,
        }
    }
}

impl Default for ForwardingPolicy {
    fn default() -> Self {
        ForwardingPolicy::TrustWeighted
    }
}

impl std::fmt::Display for ForwardingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ForwardingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uniform" | "baseline" | "random" => Ok(ForwardingPolicy::Uniform),
            "greedy" | "shortest" => Ok(ForwardingPolicy::Greedy),
            "trust" | "trusty" | "trust_weighted" => Ok(ForwardingPolicy::TrustWeighted),
            _ => Err(format!("Unknown policy: {}", s)),
        }
    }
}

/// Converts scores into a probability distribution.
///
/// `p_i = exp(s_i - max) / Σ_j exp(s_j - max)`. Shifting by the maximum
/// keeps every exponent `<= 0`, so large scores cannot overflow. Equal
/// scores give a uniform distribution. Returns an empty vector for empty
/// input.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();

    exps.into_iter().map(|e| e / sum).collect()
}

/// Distinct immediate next hops (second element) across `paths`, ascending.
pub fn unique_next_hops<'a>(paths: impl IntoIterator<Item = &'a Vec<NodeId>>) -> Vec<NodeId> {
    paths
        .into_iter()
        .filter_map(|path| path.get(1).copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Draws one of `hops` with softmax probabilities over `scores`.
pub fn weighted_choice<R>(hops: &[NodeId], scores: &[f64], rng: &mut R) -> Option<NodeId>
where
    R: RandomSource + ?Sized,
{
    if hops.is_empty() || hops.len() != scores.len() {
        return None;
    }
    let weights = softmax(scores);
    let pick = rng.weighted_index(&weights).ok()?;
    hops.get(pick).copied()
}

/// Picks the next hop among `paths` according to `policy`.
///
/// Every path must start at the selecting device. Returns `None` when no
/// path has a second node.
pub fn select_next_hop<R>(
    policy: ForwardingPolicy,
    paths: &[Vec<NodeId>],
    trust: &TrustStore,
    rng: &mut R,
) -> Option<NodeId>
where
    R: RandomSource + ?Sized,
{
    match policy {
        ForwardingPolicy::Uniform => {
            let pick = rng.index(paths.len()).ok()?;
            paths.get(pick)?.get(1).copied()
        }
        ForwardingPolicy::Greedy => {
            let shortest = paths.iter().map(Vec::len).min()?;
            let hops = unique_next_hops(paths.iter().filter(|p| p.len() == shortest));
            let pick = rng.index(hops.len()).ok()?;
            hops.get(pick).copied()
        }
        ForwardingPolicy::TrustWeighted => {
            let hops = unique_next_hops(paths);
            let scores = trust.scores_for(&hops);
            weighted_choice(&hops, &scores, rng)
        }
    }
}
