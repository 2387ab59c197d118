//! Inventory error types.

use thiserror::Error;

pub type InventoryResult<T> = Result<T, InventoryError>;

/// Failure to obtain the inventory. Always fatal for a run.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Command {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("invalid inventory document: {0}")]
    Parse(#[from] serde_json::Error),
}
