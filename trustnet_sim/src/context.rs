//! Simulation context implementing ForwardingContext for deterministic runs.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use trustnet_core::{DeliveryCounters, ForwardingContext, Topology};
use trustnet_env::{MessageId, RandomSource};

/// Seeded random source backed by ChaCha8.
pub struct SimRandom {
    /// Master seed for this run
    seed: u64,

    /// Deterministic RNG for every stochastic decision
    rng: ChaCha8Rng,
}

impl SimRandom {
    /// Creates a source from the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SimRandom {
    fn entropy(&mut self) -> &mut dyn RngCore {
        &mut self.rng
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

/// Per-run simulation context.
///
/// Holds the topology every device reads, the run's counters and its
/// random source. Lifecycle:
/// created when a `SimWorld` is built, mutated while rounds run, read
/// once for the report, dropped with the world.
pub struct SimContext {
    /// Shared, read-only network graph
    topology: Arc<Topology>,

    /// Delivery counters
    counters: DeliveryCounters,

    /// Seeded random source
    random: SimRandom,

    /// Next message id to hand out
    next_id: MessageId,
}

impl SimContext {
    /// Creates a new SimContext with the given seed.
    pub fn new(seed: u64, topology: Arc<Topology>) -> Self {
        Self {
            topology,
            counters: DeliveryCounters::new(),
            random: SimRandom::new(seed),
            next_id: MessageId(0),
        }
    }

    /// Returns the run's seed.
    pub fn seed(&self) -> u64 {
        self.random.seed()
    }

    /// Returns a handle to the topology.
    pub fn shared_topology(&self) -> Arc<Topology> {
        Arc::clone(&self.topology)
    }

    /// Returns the counters accumulated so far.
    pub fn counters(&self) -> &DeliveryCounters {
        &self.counters
    }

    /// Number of messages created so far (pings and pongs).
    pub fn messages_created(&self) -> u64 {
        self.next_id.0
    }
}

impl ForwardingContext for SimContext {
    type Random = SimRandom;

    fn topology(&self) -> &Topology {
        &self.topology
    }

    fn counters_mut(&mut self) -> &mut DeliveryCounters {
        &mut self.counters
    }

    fn random(&mut self) -> &mut SimRandom {
        &mut self.random
    }

    fn next_message_id(&mut self) -> MessageId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }
}
