//! Batch planner: groups cluster members by credential pair.

use autopatch_core::{ExecutionBatch, ProbedHost};

/// Plan the batches for one cluster.
///
/// Ineligible members are dropped. The rest are grouped by exact
/// user/secret equality, one batch per pair, in order of first
/// occurrence and then stably sorted by user so reports are
/// reproducible. Every eligible member lands in exactly one batch.
pub fn plan_batches(cluster: &str, members: &[&ProbedHost]) -> Vec<ExecutionBatch> {
    let mut batches: Vec<ExecutionBatch> = Vec::new();

    for member in members.iter().filter(|m| m.record.eligible) {
        let credentials = &member.record.credentials;
        match batches.iter_mut().find(|b| &b.credentials == credentials) {
            Some(batch) => {
                if !batch.hosts.iter().any(|h| h == member.id()) {
                    batch.hosts.push(member.id().to_string());
                }
            }
            None => batches.push(ExecutionBatch {
                group: cluster.to_string(),
                credentials: credentials.clone(),
                hosts: vec![member.id().to_string()],
            }),
        }
    }

    batches.sort_by(|a, b| a.credentials.user().cmp(b.credentials.user()));
    batches
}
