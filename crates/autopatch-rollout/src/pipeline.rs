//! Run pipeline: classify, probe, execute, report.
//!
//! Probing finishes completely (standalone first, then each cluster)
//! before any command runs. Execution happens on the blocking pool.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{error, info};

use autopatch_core::{
    ClusterOutcome, CredentialSet, HostId, HostOutcome, HostRecord, OutcomeStatus, ProbePhase,
    ProbedHost, StatusCounts,
};
use autopatch_inventory::{InventoryProvider, Topology};
use autopatch_probe::ProbePool;

use crate::controller::PatchController;

/// Format of [`RunReport::run_id`].
pub const RUN_ID_FORMAT: &str = "%Y%m%d-%H%M%S";

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub env: String,
    pub dry_run: bool,
    pub cluster_suffix: String,
}

/// Everything a run produced, handed to the report sink.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub env: String,
    pub run_id: String,
    pub dry_run: bool,
    /// RFC 3339, local time.
    pub generated_at: String,
    pub standalone_probes: Vec<ProbedHost>,
    pub cluster_probes: BTreeMap<String, Vec<ProbedHost>>,
    pub standalone: Vec<HostOutcome>,
    pub clusters: Vec<ClusterOutcome>,
    pub standalone_counts: StatusCounts,
    pub cluster_counts: StatusCounts,
}

impl RunReport {
    fn new(options: &PipelineOptions, started: DateTime<Local>) -> Self {
        Self {
            env: options.env.clone(),
            run_id: started.format(RUN_ID_FORMAT).to_string(),
            dry_run: options.dry_run,
            generated_at: started.to_rfc3339(),
            standalone_probes: Vec::new(),
            cluster_probes: BTreeMap::new(),
            standalone: Vec::new(),
            clusters: Vec::new(),
            standalone_counts: StatusCounts::default(),
            cluster_counts: StatusCounts::default(),
        }
    }

    /// Standalone hosts that ended FAILED.
    pub fn failed_hosts(&self) -> Vec<&str> {
        self.standalone
            .iter()
            .filter(|o| o.status == OutcomeStatus::Failed)
            .map(|o| o.host.as_str())
            .collect()
    }

    /// Clusters that ended FAILED.
    pub fn failed_clusters(&self) -> Vec<&str> {
        self.clusters
            .iter()
            .filter(|o| o.status == OutcomeStatus::Failed)
            .map(|o| o.cluster.as_str())
            .collect()
    }
}

/// Run one full pass over the inventory.
///
/// Never fails: every probe and batch error ends up in an outcome.
pub async fn run_pipeline<I>(
    inventory: &I,
    credentials: &CredentialSet,
    pool: &ProbePool,
    controller: Arc<PatchController>,
    options: &PipelineOptions,
) -> RunReport
where
    I: InventoryProvider + ?Sized,
{
    let mut report = RunReport::new(options, Local::now());
    let topology = Topology::classify(inventory, &options.cluster_suffix);
    info!(
        env = %options.env,
        run_id = %report.run_id,
        dry_run = options.dry_run,
        standalone = topology.standalone.len(),
        clusters = topology.clusters.len(),
        "starting run"
    );

    let standalone_records = host_records(inventory, credentials, &topology.standalone);
    report.standalone_probes = pool
        .probe_all(&ProbePhase::Standalone, standalone_records)
        .await;
    for (name, members) in &topology.clusters {
        let phase = ProbePhase::Cluster(name.clone());
        let records = host_records(inventory, credentials, members);
        let probed = pool.probe_all(&phase, records).await;
        report.cluster_probes.insert(name.clone(), probed);
    }

    let standalone = report.standalone_probes.clone();
    let clusters = report.cluster_probes.clone();
    let task = tokio::task::spawn_blocking(move || {
        let standalone = controller.run_standalone(&standalone);
        let clusters: Vec<ClusterOutcome> = clusters
            .iter()
            .map(|(name, members)| controller.run_cluster(name, members))
            .collect();
        (standalone, clusters)
    });

    let (standalone, clusters) = match task.await {
        Ok(outcomes) => outcomes,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => {
            error!(error = %e, "patch task cancelled");
            (Vec::new(), Vec::new())
        }
    };

    report.standalone_counts = StatusCounts::tally(standalone.iter().map(|o| o.status));
    report.cluster_counts = StatusCounts::tally(clusters.iter().map(|o| o.status));
    report.standalone = standalone;
    report.clusters = clusters;

    info!(
        run_id = %report.run_id,
        standalone_ok = report.standalone_counts.ok,
        standalone_failed = report.standalone_counts.failed,
        standalone_skipped = report.standalone_counts.skipped,
        clusters_ok = report.cluster_counts.ok,
        clusters_failed = report.cluster_counts.failed,
        clusters_skipped = report.cluster_counts.skipped,
        "run finished"
    );
    report
}

fn host_records<I>(inventory: &I, credentials: &CredentialSet, hosts: &[HostId]) -> Vec<HostRecord>
where
    I: InventoryProvider + ?Sized,
{
    hosts
        .iter()
        .map(|id| HostRecord::from_vars(id, &inventory.host_vars(id), credentials))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_uses_compact_timestamp() {
        let options = PipelineOptions {
            env: "qa".to_string(),
            dry_run: true,
            cluster_suffix: "_cluster".to_string(),
        };
        let started = Local::now();
        let report = RunReport::new(&options, started);
        assert_eq!(report.run_id.len(), "20260101-120000".len());
        assert_eq!(report.run_id.as_bytes()[8], b'-');
        assert!(report.dry_run);
        assert!(report.failed_hosts().is_empty());
    }
}
