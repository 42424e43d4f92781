//! TrustNet Environment Abstraction Layer
//!
//! This crate provides the small "Sans-IO" surface the forwarding engine
//! needs from the outside world so that the same device code runs against
//! OS entropy in ad-hoc use and against a seeded generator in simulation.
//!
//! # Core Concept: One Random Source
//!
//! Every stochastic decision in the network goes through a single
//! [`RandomSource`]:
//! - Destination choice when a device produces a message
//! - The per-hop greed trial of a relay
//! - The weighted next-hop draw of the selector
//!
//! By deriving all of these from one 64-bit seed, any run becomes
//! reproducible via its seed number.
//!
//! # Example
//!
//! ```ignore
//! use trustnet_env::{OsRandom, RandomSource};
//!
//! let mut rng = OsRandom::new();
//! let hop = rng.weighted_index(&[0.25, 0.75])?;
//! ```

mod random;
mod types;
mod error;
mod os_impl;

pub use random::RandomSource;
pub use types::{NodeId, MessageId};
pub use error::EnvError;
pub use os_impl::OsRandom;
