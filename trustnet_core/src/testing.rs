//! Deterministic doubles for unit tests.

use crate::context::ForwardingContext;
use crate::metrics::DeliveryCounters;
use crate::topology::{Topology, TopologySpec};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use trustnet_env::{MessageId, RandomSource};

/// Seeded random source.
pub(crate) struct Seeded {
    seed: u64,
    rng: ChaCha8Rng,
}

impl Seeded {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for Seeded {
    fn entropy(&mut self) -> &mut dyn RngCore {
        &mut self.rng
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

/// Owned forwarding context over a fixed topology.
pub(crate) struct TestContext {
    pub(crate) topology: Topology,
    pub(crate) counters: DeliveryCounters,
    pub(crate) rng: Seeded,
    next_id: MessageId,
}

impl TestContext {
    pub(crate) fn new(spec: &TopologySpec, seed: u64) -> Self {
        Self {
            topology: spec.build().unwrap(),
            counters: DeliveryCounters::new(),
            rng: Seeded::new(seed),
            next_id: MessageId(0),
        }
    }
}

impl ForwardingContext for TestContext {
    type Random = Seeded;

    fn topology(&self) -> &Topology {
        &self.topology
    }

    fn counters_mut(&mut self) -> &mut DeliveryCounters {
        &mut self.counters
    }

    fn random(&mut self) -> &mut Seeded {
        &mut self.rng
    }

    fn next_message_id(&mut self) -> MessageId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }
}
