//! autopatch-probe: host health probing before any patch runs.
//!
//! Each host gets three checks in order: ICMP echo, TCP connect to the
//! SSH port, and (only when the port is open) an authenticated login.
//! The login result is tri-state: a closed port leaves it `Unknown`.
//!
//! # Architecture
//!
//! ```text
//! ProbePool (semaphore-bounded, one task per host, join barrier)
//!   └── Prober
//!         └── HostChecks (SystemChecks: ping / TcpStream / sshpass+ssh)
//! ```
//!
//! Probes never retry and never fail a run: every error ends up as text
//! on the `ProbeResult`.

pub mod checks;
pub mod error;
pub mod pool;
pub mod prober;

pub use checks::{CheckFuture, HostChecks, SystemChecks};
pub use error::ProbeError;
pub use pool::ProbePool;
pub use prober::{Prober, SSH_PORT};
