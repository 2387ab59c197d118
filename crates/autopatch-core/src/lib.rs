//! autopatch-core: shared vocabulary for the patch orchestrator.
//!
//! Every other crate speaks in these types: the host record built from
//! inventory variables, the tri-state probe result, the execution batch,
//! and the OK/FAILED/SKIPPED outcome records handed to the report sink.

pub mod config;
pub mod host;
pub mod observer;
pub mod types;

pub use config::{
    ConfigError, ConfigResult, CredentialConfig, CredentialsConfig, PatchConfig, PlaybookConfig,
};
pub use host::{CredentialSet, Credentials, HostRecord, HostVars, ProbedHost};
pub use observer::{ProbePhase, RunObserver, TracingObserver};
pub use types::*;
