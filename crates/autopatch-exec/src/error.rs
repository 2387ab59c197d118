use thiserror::Error;

pub type ExecResult<T> = Result<T, ExecError>;

/// The runner could not be invoked. Never a remote failure: those come
/// back as a non-zero exit in [`crate::RawOutput`].
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// An empty limit would let the playbook select its own hosts.
    #[error("refusing to run {playbook} without a host limit")]
    NoHosts { playbook: String },
}
