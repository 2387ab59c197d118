//! autopatch-exec: drives the external update command for one batch.
//!
//! # Architecture
//!
//! ```text
//! execute_batch
//!   ├── PlaybookCatalog   group → playbook path
//!   ├── CommandRunner     ansible-playbook (blocking, no timeout)
//!   └── FailureParser     stdout/stderr → failed hosts
//! ```
//!
//! The runner reports what the process said; the parser recovers which
//! hosts actually failed. A batch fails when either one says so.

pub mod catalog;
pub mod error;
pub mod execute;
pub mod parser;
pub mod runner;

pub use catalog::PlaybookCatalog;
pub use error::{ExecError, ExecResult};
pub use execute::{ParseAmbiguity, execute_batch};
pub use parser::{AnsibleFailureParser, FailureParser};
pub use runner::{AnsiblePlaybookRunner, CommandRunner, PLAYBOOK_PROGRAM, RawOutput};
