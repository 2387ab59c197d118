//! Probe error types.

use std::time::Duration;

use thiserror::Error;

/// Why a check could not produce a verdict. Recorded on the probe result,
/// never propagated.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("probe task aborted: {0}")]
    Aborted(String),
}
