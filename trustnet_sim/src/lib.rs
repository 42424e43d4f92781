//! TrustNet Simulation Harness
//!
//! Runs deterministic ping/pong experiments over `trustnet_core` devices.
//! Every run owns its own [`SimContext`], seeded from the run's seed, so the
//! same seed and configuration always reproduce the same counters.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                    SimWorld                      │
//! │  ┌────────────┐  Step::Forward  ┌────────────┐   │
//! │  │  Device 0  │ ──────────────► │  mailbox 1 │   │
//! │  └────────────┘                 └─────┬──────┘   │
//! │        ▲                              ▼          │
//! │        │  Delivered / Dropped   ┌────────────┐   │
//! │        └──────── traces ◄────── │  Device 1  │   │
//! │                                 └────────────┘   │
//! │  SimContext: topology + counters + ChaCha8 RNG   │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use trustnet_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42).run(&ScenarioId::Campus.into())?;
//! println!("{:?}", result.outcome.reliability);
//! ```

pub mod context;
pub mod error;
pub mod exporter;
pub mod report;
pub mod runner;
pub mod scenarios;
pub mod world;

pub use context::{SimContext, SimRandom};
pub use error::SimError;
pub use exporter::RunExport;
pub use runner::{RunJob, RunResult, ScenarioRunner, TopologySource};
pub use world::{MessageTrace, RunOutcome, SimConfig, SimWorld, TraceOutcome, TrustSummary};
