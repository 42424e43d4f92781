//! Error types for the TrustNet environment abstraction.

use thiserror::Error;

/// Errors that can occur when drawing from a random source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    /// A uniform choice was requested over zero options
    #[error("Cannot choose from an empty set")]
    EmptyChoice,

    /// Weights were empty, negative, non-finite or summed to zero
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),
}

impl EnvError {
    /// Creates an invalid-weights error.
    pub fn weights(msg: impl std::fmt::Display) -> Self {
        Self::InvalidWeights(msg.to_string())
    }
}
