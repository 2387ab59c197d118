//! Run observer: structured events emitted by the probe and patch phases.
//!
//! Components receive an `Arc<dyn RunObserver>` instead of logging to a
//! shared global. The default [`TracingObserver`] forwards each event to
//! `tracing` as one structured record.

use std::fmt;

use tracing::{debug, info, warn};

use crate::types::{BatchResult, ClusterOutcome, HostOutcome, OutcomeStatus, ProbeResult};

/// Which probe pass a result belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbePhase {
    Standalone,
    Cluster(String),
}

impl fmt::Display for ProbePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbePhase::Standalone => f.write_str("standalone"),
            ProbePhase::Cluster(name) => f.write_str(name),
        }
    }
}

/// Receives run events. All methods default to no-ops.
pub trait RunObserver: Send + Sync {
    fn probe_completed(&self, _phase: &ProbePhase, _result: &ProbeResult) {}

    /// `group` is the cluster name or `standalone`.
    fn host_finished(&self, _group: &str, _outcome: &HostOutcome) {}

    fn batch_finished(&self, _cluster: &str, _batch: &BatchResult) {}

    fn cluster_finished(&self, _outcome: &ClusterOutcome) {}
}

/// Forwards run events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn probe_completed(&self, phase: &ProbePhase, result: &ProbeResult) {
        debug!(
            %phase,
            host = %result.host,
            address = %result.address,
            ping = result.ping_ok,
            ssh = result.ssh_port_open,
            login = %result.login,
            user = %result.user,
            error = result.error.as_deref().unwrap_or(""),
            "probe completed"
        );
    }

    fn host_finished(&self, group: &str, outcome: &HostOutcome) {
        let peers = outcome.failed_peers.join(",");
        match outcome.status {
            OutcomeStatus::Failed => warn!(
                group,
                host = %outcome.host,
                status = %outcome.status,
                duration_secs = outcome.duration_secs,
                reason = %outcome.reason,
                failed_hosts = %peers,
                "host finished"
            ),
            OutcomeStatus::Ok | OutcomeStatus::Skipped => info!(
                group,
                host = %outcome.host,
                status = %outcome.status,
                duration_secs = outcome.duration_secs,
                reason = %outcome.reason,
                "host finished"
            ),
        }
    }

    fn batch_finished(&self, cluster: &str, batch: &BatchResult) {
        let hosts = batch.hosts.join(",");
        let failed = batch.failed_hosts.join(",");
        if batch.is_failure() {
            warn!(
                cluster,
                user = %batch.user,
                duration_secs = batch.duration_secs,
                %hosts,
                failed_hosts = %failed,
                "batch failed"
            );
        } else {
            info!(
                cluster,
                user = %batch.user,
                duration_secs = batch.duration_secs,
                %hosts,
                "batch ok"
            );
        }
    }

    fn cluster_finished(&self, outcome: &ClusterOutcome) {
        let failed = outcome.failed_hosts.join(",");
        info!(
            cluster = %outcome.cluster,
            status = %outcome.status,
            duration_secs = outcome.duration_secs,
            reason = %outcome.reason,
            failed_hosts = %failed,
            "cluster finished"
        );
    }
}
