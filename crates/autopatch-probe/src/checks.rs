//! Individual host checks.
//!
//! [`HostChecks`] is the seam between the prober and the network. The
//! system implementation shells out to `ping` and `sshpass`/`ssh` and uses
//! a tokio TCP connect for the port check.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::process::Command;
use tracing::debug;

use autopatch_core::Credentials;

use crate::error::ProbeError;

/// Boxed future returned by [`HostChecks`] methods.
pub type CheckFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Extra time granted to child processes on top of the probe timeout.
const PROCESS_SLACK: Duration = Duration::from_secs(2);

/// The three checks a probe runs, injected for testability.
pub trait HostChecks: Send + Sync {
    /// One ICMP echo. `true` when answered.
    fn ping<'a>(&'a self, address: &'a str, timeout: Duration) -> CheckFuture<'a, bool>;

    /// TCP connect to `address:port` within `timeout`.
    fn port_open<'a>(
        &'a self,
        address: &'a str,
        port: u16,
        timeout: Duration,
    ) -> CheckFuture<'a, bool>;

    /// Authenticated login. `Ok(false)` means the credentials were refused.
    fn login<'a>(
        &'a self,
        address: &'a str,
        credentials: &'a Credentials,
        timeout: Duration,
    ) -> CheckFuture<'a, Result<bool, ProbeError>>;
}

/// Checks backed by the system `ping`, tokio TCP, and `sshpass` + `ssh`.
#[derive(Debug, Clone)]
pub struct SystemChecks {
    ping_program: String,
    sshpass_program: String,
}

impl Default for SystemChecks {
    fn default() -> Self {
        Self {
            ping_program: "ping".to_string(),
            sshpass_program: "sshpass".to_string(),
        }
    }
}

impl SystemChecks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the programs used for ping and login.
    pub fn with_programs(ping: &str, sshpass: &str) -> Self {
        Self {
            ping_program: ping.to_string(),
            sshpass_program: sshpass.to_string(),
        }
    }
}

impl HostChecks for SystemChecks {
    fn ping<'a>(&'a self, address: &'a str, timeout: Duration) -> CheckFuture<'a, bool> {
        Box::pin(async move {
            let mut cmd = Command::new(&self.ping_program);
            if cfg!(windows) {
                cmd.args(["-n", "1", "-w"])
                    .arg(timeout.as_millis().max(1).to_string());
            } else {
                cmd.args(["-c", "1", "-W"])
                    .arg(whole_secs(timeout).to_string());
            }
            cmd.arg(address)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true);

            match tokio::time::timeout(timeout + PROCESS_SLACK, cmd.status()).await {
                Ok(Ok(status)) => status.success(),
                Ok(Err(e)) => {
                    debug!(error = %e, %address, program = %self.ping_program, "ping could not run");
                    false
                }
                Err(_) => {
                    debug!(%address, "ping timed out");
                    false
                }
            }
        })
    }

    fn port_open<'a>(
        &'a self,
        address: &'a str,
        port: u16,
        timeout: Duration,
    ) -> CheckFuture<'a, bool> {
        Box::pin(async move {
            match tokio::time::timeout(timeout, TcpStream::connect((address, port))).await {
                Ok(Ok(_stream)) => true,
                Ok(Err(e)) => {
                    debug!(error = %e, %address, port, "port check failed");
                    false
                }
                Err(_) => {
                    debug!(%address, port, "port check timed out");
                    false
                }
            }
        })
    }

    fn login<'a>(
        &'a self,
        address: &'a str,
        credentials: &'a Credentials,
        timeout: Duration,
    ) -> CheckFuture<'a, Result<bool, ProbeError>> {
        Box::pin(async move {
            let mut cmd = Command::new(&self.sshpass_program);
            cmd.arg("-p")
                .arg(credentials.secret())
                .arg("ssh")
                .args(["-o", "BatchMode=no"])
                .args(["-o", "StrictHostKeyChecking=no"])
                .args(["-o", "UserKnownHostsFile=/dev/null"])
                .arg("-o")
                .arg(format!("ConnectTimeout={}", whole_secs(timeout)))
                .arg(format!("{}@{}", credentials.user(), address))
                .arg("true")
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true);

            let limit = timeout + PROCESS_SLACK;
            match tokio::time::timeout(limit, cmd.status()).await {
                Ok(Ok(status)) => Ok(status.success()),
                Ok(Err(source)) => Err(ProbeError::Spawn {
                    program: self.sshpass_program.clone(),
                    source,
                }),
                Err(_) => Err(ProbeError::Timeout(limit)),
            }
        })
    }
}

/// Whole seconds for command-line timeouts, at least one.
fn whole_secs(timeout: Duration) -> u64 {
    timeout.as_secs_f64().ceil().max(1.0) as u64
}
