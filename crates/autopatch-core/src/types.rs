//! Domain types shared across the autopatch crates.
//!
//! Everything here is created fresh per run and never mutated once
//! built: outcomes are assembled from probe and execution results, not
//! updated in place.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::host::Credentials;

/// Inventory host identifier.
pub type HostId = String;

/// Group name used for batches that do not belong to a cluster.
pub const STANDALONE: &str = "standalone";

// ── Probe ──────────────────────────────────────────────────────────

/// Outcome of the authenticated login step of a probe.
///
/// `Unknown` means the login was never attempted because the SSH port
/// was not reachable. It must not be read as a failed login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum LoginStatus {
    Unknown,
    Succeeded,
    Failed,
}

impl From<Option<bool>> for LoginStatus {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => LoginStatus::Unknown,
            Some(true) => LoginStatus::Succeeded,
            Some(false) => LoginStatus::Failed,
        }
    }
}

impl From<LoginStatus> for Option<bool> {
    fn from(value: LoginStatus) -> Self {
        match value {
            LoginStatus::Unknown => None,
            LoginStatus::Succeeded => Some(true),
            LoginStatus::Failed => Some(false),
        }
    }
}

impl fmt::Display for LoginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginStatus::Unknown => f.write_str("n/a"),
            LoginStatus::Succeeded => f.write_str("true"),
            LoginStatus::Failed => f.write_str("false"),
        }
    }
}

/// Result of probing one host: reachability, SSH port, and login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub host: HostId,
    pub address: String,
    pub ping_ok: bool,
    pub ssh_port_open: bool,
    pub login: LoginStatus,
    /// User the login was attempted with.
    pub user: String,
    pub error: Option<String>,
}

impl ProbeResult {
    /// The first failing check, if any.
    ///
    /// An `Unknown` login only counts as a failure through the closed port
    /// that caused it.
    pub fn failure(&self) -> Option<ProbeFailure> {
        if !self.ping_ok {
            return Some(ProbeFailure::PingFailed);
        }
        if !self.ssh_port_open {
            return Some(ProbeFailure::PortClosed);
        }
        match self.login {
            LoginStatus::Failed => Some(ProbeFailure::LoginFailed),
            LoginStatus::Succeeded | LoginStatus::Unknown => None,
        }
    }

    pub fn passed(&self) -> bool {
        self.failure().is_none()
    }
}

/// Which probe check made a host ineligible for execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeFailure {
    PingFailed,
    PortClosed,
    LoginFailed,
}

impl ProbeFailure {
    pub fn reason(&self) -> &'static str {
        match self {
            ProbeFailure::PingFailed => "probe: ping failed",
            ProbeFailure::PortClosed => "probe: ssh port closed",
            ProbeFailure::LoginFailed => "probe: ssh login failed",
        }
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

// ── Execution ──────────────────────────────────────────────────────

/// One external command invocation: a set of hosts sharing a credential pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionBatch {
    /// Cluster name, or [`STANDALONE`].
    pub group: String,
    pub credentials: Credentials,
    pub hosts: Vec<HostId>,
}

/// What came back from running the update command for one batch.
///
/// `failed_hosts` is recovered from the output text, not reported by the
/// command itself.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandExecutionResult {
    pub success: bool,
    pub duration: Duration,
    pub stdout: String,
    pub stderr: String,
    pub failed_hosts: Vec<HostId>,
}

impl CommandExecutionResult {
    /// Result for a command that could not be invoked at all.
    pub fn not_invoked() -> Self {
        Self {
            success: false,
            duration: Duration::ZERO,
            stdout: String::new(),
            stderr: String::new(),
            failed_hosts: Vec::new(),
        }
    }

    /// A batch failed if the exit status says so or any host was recovered
    /// as failed from the output.
    pub fn is_failure(&self) -> bool {
        !self.success || !self.failed_hosts.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

// ── Outcomes ───────────────────────────────────────────────────────

/// Final status of a host or cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutcomeStatus {
    Ok,
    Failed,
    Skipped,
}

impl OutcomeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OutcomeStatus::Ok => "OK",
            OutcomeStatus::Failed => "FAILED",
            OutcomeStatus::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-host outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostOutcome {
    pub host: HostId,
    pub status: OutcomeStatus,
    pub reason: String,
    pub duration_secs: f64,
    pub user: String,
    /// Hosts reported failed by the same batch. Empty unless FAILED.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_peers: Vec<HostId>,
}

impl HostOutcome {
    pub fn skipped(host: &str, user: &str, reason: impl Into<String>) -> Self {
        Self {
            host: host.to_string(),
            status: OutcomeStatus::Skipped,
            reason: reason.into(),
            duration_secs: 0.0,
            user: user.to_string(),
            failed_peers: Vec::new(),
        }
    }

    pub fn ok(host: &str, user: &str, duration_secs: f64) -> Self {
        Self {
            host: host.to_string(),
            status: OutcomeStatus::Ok,
            reason: "patch ok".to_string(),
            duration_secs,
            user: user.to_string(),
            failed_peers: Vec::new(),
        }
    }

    pub fn failed(host: &str, user: &str, duration_secs: f64, failed_peers: Vec<HostId>) -> Self {
        Self {
            host: host.to_string(),
            status: OutcomeStatus::Failed,
            reason: "playbook failed".to_string(),
            duration_secs,
            user: user.to_string(),
            failed_peers,
        }
    }
}

/// Result of one batch inside a cluster run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub user: String,
    pub hosts: Vec<HostId>,
    pub success: bool,
    pub duration_secs: f64,
    pub failed_hosts: Vec<HostId>,
}

impl BatchResult {
    pub fn is_failure(&self) -> bool {
        !self.success || !self.failed_hosts.is_empty()
    }
}

/// Per-cluster outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterOutcome {
    pub cluster: String,
    pub status: OutcomeStatus,
    pub reason: String,
    /// Sum of batch durations.
    pub duration_secs: f64,
    /// Sorted, deduplicated.
    pub failed_hosts: Vec<HostId>,
    /// In execution order.
    pub batches: Vec<BatchResult>,
    /// One outcome per cluster member, sorted by host.
    pub members: Vec<HostOutcome>,
}

/// OK/FAILED/SKIPPED tally over a set of outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub ok: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
}

impl StatusCounts {
    pub fn tally<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = OutcomeStatus>,
    {
        statuses.into_iter().fold(Self::default(), |mut acc, status| {
            match status {
                OutcomeStatus::Ok => acc.ok += 1,
                OutcomeStatus::Failed => acc.failed += 1,
                OutcomeStatus::Skipped => acc.skipped += 1,
            }
            acc.total += 1;
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(ping_ok: bool, ssh_port_open: bool, login: LoginStatus) -> ProbeResult {
        ProbeResult {
            host: "web01".to_string(),
            address: "10.0.0.1".to_string(),
            ping_ok,
            ssh_port_open,
            login,
            user: "ansible".to_string(),
            error: None,
        }
    }

    #[test]
    fn probe_failure_reports_first_failing_check() {
        assert_eq!(
            probe(false, false, LoginStatus::Unknown).failure(),
            Some(ProbeFailure::PingFailed)
        );
        assert_eq!(
            probe(true, false, LoginStatus::Unknown).failure(),
            Some(ProbeFailure::PortClosed)
        );
        assert_eq!(
            probe(true, true, LoginStatus::Failed).failure(),
            Some(ProbeFailure::LoginFailed)
        );
        assert!(probe(true, true, LoginStatus::Succeeded).passed());
    }

    #[test]
    fn login_status_serializes_as_nullable_bool() {
        let json = serde_json::to_value(probe(true, false, LoginStatus::Unknown)).unwrap();
        assert!(json["login"].is_null());

        let json = serde_json::to_value(probe(true, true, LoginStatus::Failed)).unwrap();
        assert_eq!(json["login"], serde_json::Value::Bool(false));
    }

    #[test]
    fn outcome_status_uses_uppercase_labels() {
        let json = serde_json::to_string(&OutcomeStatus::Skipped).unwrap();
        assert_eq!(json, "\"SKIPPED\"");
        assert_eq!(OutcomeStatus::Failed.to_string(), "FAILED");
    }

    #[test]
    fn command_result_failure_wins_over_exit_status() {
        let mut result = CommandExecutionResult::not_invoked();
        assert!(result.is_failure());

        result.success = true;
        assert!(!result.is_failure());

        result.failed_hosts.push("db01".to_string());
        assert!(result.is_failure());
    }

    #[test]
    fn status_counts_tally() {
        let counts = StatusCounts::tally([
            OutcomeStatus::Ok,
            OutcomeStatus::Ok,
            OutcomeStatus::Failed,
            OutcomeStatus::Skipped,
        ]);
        assert_eq!(
            counts,
            StatusCounts {
                ok: 2,
                failed: 1,
                skipped: 1,
                total: 4
            }
        );
    }
}
