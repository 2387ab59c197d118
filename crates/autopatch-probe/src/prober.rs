//! Prober: runs the ordered checks for one host.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use autopatch_core::{Credentials, HostRecord, LoginStatus, ProbeResult};

use crate::checks::{HostChecks, SystemChecks};

/// Administrative port checked before a login is attempted.
pub const SSH_PORT: u16 = 22;

/// Probes one host at a time. Cheap to share behind an `Arc`.
#[derive(Clone)]
pub struct Prober {
    checks: Arc<dyn HostChecks>,
    timeout: Duration,
    ssh_port: u16,
}

impl Prober {
    pub fn new(checks: Arc<dyn HostChecks>, timeout: Duration) -> Self {
        Self {
            checks,
            timeout,
            ssh_port: SSH_PORT,
        }
    }

    /// Prober backed by [`SystemChecks`].
    pub fn system(timeout: Duration) -> Self {
        Self::new(Arc::new(SystemChecks::new()), timeout)
    }

    /// Check a different port than 22.
    pub fn with_port(mut self, port: u16) -> Self {
        self.ssh_port = port;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe a host: ping, then the SSH port, then a login if the port is open.
    ///
    /// Ping and the port check always both run; a host may drop ICMP and
    /// still accept SSH. A single timeout is final; nothing is retried.
    pub async fn probe(&self, host: &str, address: &str, credentials: &Credentials) -> ProbeResult {
        let ping_ok = self.checks.ping(address, self.timeout).await;
        let ssh_port_open = self
            .checks
            .port_open(address, self.ssh_port, self.timeout)
            .await;

        let (login, error) = if ssh_port_open {
            match self.checks.login(address, credentials, self.timeout).await {
                Ok(true) => (LoginStatus::Succeeded, None),
                Ok(false) => (LoginStatus::Failed, None),
                Err(e) => {
                    debug!(%host, %address, error = %e, "probe error");
                    (LoginStatus::Failed, Some(e.to_string()))
                }
            }
        } else {
            (LoginStatus::Unknown, None)
        };

        ProbeResult {
            host: host.to_string(),
            address: address.to_string(),
            ping_ok,
            ssh_port_open,
            login,
            user: credentials.user().to_string(),
            error,
        }
    }

    pub async fn probe_record(&self, record: &HostRecord) -> ProbeResult {
        self.probe(&record.id, &record.address, &record.credentials).await
    }
}
