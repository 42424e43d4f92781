//! Error types for the simulation harness.

use thiserror::Error;
use trustnet_core::TopologyError;

/// Errors that stop a run before it starts.
///
/// Nothing that happens to a message inside a run is an error; see
/// `trustnet_core::DropReason`.
#[derive(Debug, Error)]
pub enum SimError {
    /// The topology description is invalid
    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),

    /// No built-in scenario has this name
    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    /// No forwarding policy has this name
    #[error("Unknown policy: {0}")]
    UnknownPolicy(String),

    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Reading a topology file or writing an export failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A parallel run panicked or was cancelled
    #[error("Run task failed: {0}")]
    Join(String),
}

impl SimError {
    /// Creates an invalid-configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
