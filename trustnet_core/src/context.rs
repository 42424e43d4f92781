//! The environment a device forwards in.

use crate::metrics::DeliveryCounters;
use crate::topology::Topology;
use trustnet_env::{MessageId, RandomSource};

/// Everything a device touches besides its own state while handling a
/// message: the shared topology, the run's counters, the run's random
/// source and the message id sequence.
///
/// # Implementations
///
/// - **Simulation**: `SimContext` - one per run, seeded `ChaCha8Rng`
/// - **Tests**: `testing::TestContext` with a fixed seed
///
/// A context is never shared between runs, so counters and randomness
/// of independent runs cannot interfere.
pub trait ForwardingContext {
    /// Random source behind every stochastic decision.
    type Random: RandomSource + ?Sized;

    /// Full network graph, identical for every device.
    fn topology(&self) -> &Topology;

    /// Run-wide delivery counters.
    fn counters_mut(&mut self) -> &mut DeliveryCounters;

    /// The run's random source.
    fn random(&mut self) -> &mut Self::Random;

    /// Allocates a fresh message id.
    fn next_message_id(&mut self) -> MessageId;
}
