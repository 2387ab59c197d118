//! Patch controller: turns probed hosts into outcome records.
//!
//! Per-host state machine:
//!
//! ```text
//! Created ─┬─ ineligible ──────────────► SKIPPED "not eligible"
//!          ├─ probe failed (standalone) ► SKIPPED "probe: ..."
//!          ├─ cluster gated ───────────► SKIPPED "probe failed for: ..."
//!          └─ executed in a batch ─────► OK | FAILED
//! ```
//!
//! Execution is blocking. Batches of a cluster run one at a time in
//! planner order, and every batch runs even after an earlier one failed.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use autopatch_core::{
    BatchResult, ClusterOutcome, CommandExecutionResult, ExecutionBatch, HostId, HostOutcome,
    OutcomeStatus, ProbedHost, RunObserver, STANDALONE,
};
use autopatch_exec::{
    AnsibleFailureParser, CommandRunner, FailureParser, PlaybookCatalog, execute_batch,
};

use crate::gate::ClusterGate;
use crate::planner::plan_batches;

pub const NOT_ELIGIBLE: &str = "not eligible";
pub const NO_ELIGIBLE_MEMBERS: &str = "no eligible members";
pub const PATCH_OK: &str = "patch ok";
pub const PLAYBOOK_FAILED: &str = "playbook failed";

pub struct PatchController {
    runner: Arc<dyn CommandRunner>,
    parser: Arc<dyn FailureParser>,
    catalog: PlaybookCatalog,
    dry_run: bool,
    observer: Arc<dyn RunObserver>,
}

impl PatchController {
    /// Controller with the default output parser, not in dry-run mode.
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        catalog: PlaybookCatalog,
        observer: Arc<dyn RunObserver>,
    ) -> Self {
        Self {
            runner,
            parser: Arc::new(AnsibleFailureParser),
            catalog,
            dry_run: false,
            observer,
        }
    }

    pub fn with_parser(mut self, parser: Arc<dyn FailureParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Patch standalone hosts one by one. A failing host never affects another.
    pub fn run_standalone(&self, hosts: &[ProbedHost]) -> Vec<HostOutcome> {
        let playbook = self.catalog.resolve(STANDALONE);
        let mut outcomes = Vec::with_capacity(hosts.len());

        for host in hosts {
            let outcome = if !host.record.eligible {
                HostOutcome::skipped(host.id(), host.user(), NOT_ELIGIBLE)
            } else if let Some(failure) = host.probe_failure() {
                HostOutcome::skipped(host.id(), host.user(), failure.reason())
            } else {
                let batch = ExecutionBatch {
                    group: STANDALONE.to_string(),
                    credentials: host.record.credentials.clone(),
                    hosts: vec![host.id().to_string()],
                };
                let result = self.execute(&batch, &playbook);
                executed_outcome(host.id(), host.user(), &result)
            };

            self.observer.host_finished(STANDALONE, &outcome);
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Patch one cluster: gate, plan, then run batches sequentially.
    pub fn run_cluster(&self, cluster: &str, members: &[ProbedHost]) -> ClusterOutcome {
        let refs: Vec<&ProbedHost> = members.iter().collect();

        let gate = ClusterGate::inspect(&refs);
        if let Some(reason) = gate.reason() {
            info!(%cluster, %reason, "cluster gated");
            let mut failed_hosts = gate.offending_hosts();
            failed_hosts.sort();
            failed_hosts.dedup();
            let outcome = ClusterOutcome {
                cluster: cluster.to_string(),
                status: OutcomeStatus::Skipped,
                members: self.skipped_members(cluster, members, &reason),
                reason,
                duration_secs: 0.0,
                failed_hosts,
                batches: Vec::new(),
            };
            self.observer.cluster_finished(&outcome);
            return outcome;
        }

        let batches = plan_batches(cluster, &refs);
        if batches.is_empty() {
            info!(%cluster, "no eligible members");
            let outcome = ClusterOutcome {
                cluster: cluster.to_string(),
                status: OutcomeStatus::Skipped,
                reason: NO_ELIGIBLE_MEMBERS.to_string(),
                duration_secs: 0.0,
                failed_hosts: Vec::new(),
                batches: Vec::new(),
                members: self.skipped_members(cluster, members, NO_ELIGIBLE_MEMBERS),
            };
            self.observer.cluster_finished(&outcome);
            return outcome;
        }

        let playbook = self.catalog.resolve(cluster);
        debug!(%cluster, batches = batches.len(), "executing batches");

        let mut batch_results = Vec::with_capacity(batches.len());
        let mut executed: HashMap<HostId, HostOutcome> = HashMap::new();
        let mut failed_hosts = BTreeSet::new();
        let mut any_failed = false;
        let mut duration_secs = 0.0;

        for batch in &batches {
            let result = self.execute(batch, &playbook);
            let user = batch.credentials.user();

            for host in &batch.hosts {
                executed.insert(host.clone(), executed_outcome(host, user, &result));
            }

            any_failed |= result.is_failure();
            failed_hosts.extend(result.failed_hosts.iter().cloned());
            duration_secs += result.duration_secs();

            let batch_result = BatchResult {
                user: user.to_string(),
                hosts: batch.hosts.clone(),
                success: result.success,
                duration_secs: result.duration_secs(),
                failed_hosts: result.failed_hosts,
            };
            self.observer.batch_finished(cluster, &batch_result);
            batch_results.push(batch_result);
        }

        let mut outcomes: Vec<HostOutcome> = members
            .iter()
            .map(|m| {
                executed
                    .remove(m.id())
                    .unwrap_or_else(|| HostOutcome::skipped(m.id(), m.user(), NOT_ELIGIBLE))
            })
            .collect();
        outcomes.sort_by(|a, b| a.host.cmp(&b.host));
        for member in &outcomes {
            self.observer.host_finished(cluster, member);
        }

        let (status, reason) = if !any_failed {
            (OutcomeStatus::Ok, PATCH_OK.to_string())
        } else if failed_hosts.is_empty() {
            (OutcomeStatus::Failed, PLAYBOOK_FAILED.to_string())
        } else {
            let listed: Vec<&str> = failed_hosts.iter().map(String::as_str).collect();
            (OutcomeStatus::Failed, format!("failed on: {}", listed.join(",")))
        };

        let outcome = ClusterOutcome {
            cluster: cluster.to_string(),
            status,
            reason,
            duration_secs,
            failed_hosts: failed_hosts.into_iter().collect(),
            batches: batch_results,
            members: outcomes,
        };
        self.observer.cluster_finished(&outcome);
        outcome
    }

    fn execute(&self, batch: &ExecutionBatch, playbook: &Path) -> CommandExecutionResult {
        execute_batch(
            self.runner.as_ref(),
            self.parser.as_ref(),
            batch,
            playbook,
            self.dry_run,
        )
    }

    /// Member outcomes for a cluster where nothing ran.
    fn skipped_members(&self, cluster: &str, members: &[ProbedHost], reason: &str) -> Vec<HostOutcome> {
        let mut outcomes: Vec<HostOutcome> = members
            .iter()
            .map(|m| {
                let why = if m.record.eligible { reason } else { NOT_ELIGIBLE };
                HostOutcome::skipped(m.id(), m.user(), why)
            })
            .collect();
        outcomes.sort_by(|a, b| a.host.cmp(&b.host));
        for member in &outcomes {
            self.observer.host_finished(cluster, member);
        }
        outcomes
    }
}

/// OK only when the batch succeeded and did not name this host.
fn executed_outcome(host: &str, user: &str, result: &CommandExecutionResult) -> HostOutcome {
    let named = result.failed_hosts.iter().any(|h| h == host);
    if result.success && !named {
        HostOutcome::ok(host, user, result.duration_secs())
    } else {
        HostOutcome::failed(host, user, result.duration_secs(), result.failed_hosts.clone())
    }
}
