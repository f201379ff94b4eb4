use thiserror::Error;

/// Errors raised while building or running a cycle simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid engine configuration. Raised once, before any simulation step runs.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A quantity degenerated (zero density, non-finite result) and the whole tick is invalid.
    #[error("numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    pub(crate) fn config(msg: impl Into<String>) -> SimError {
        SimError::Configuration(msg.into())
    }

    pub(crate) fn degenerate(msg: impl Into<String>) -> SimError {
        SimError::NumericDegeneracy(msg.into())
    }
}
