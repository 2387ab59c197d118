//! Probe pool: bounded parallel probing with a join barrier.
//!
//! One task per host; a semaphore caps how many run at once. `probe_all`
//! returns only after every task of the phase has finished, so probing
//! never overlaps with command execution.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error};

use autopatch_core::{
    HostRecord, LoginStatus, ProbePhase, ProbeResult, ProbedHost, RunObserver,
};

use crate::error::ProbeError;
use crate::prober::Prober;

/// Runs probes on a fixed number of workers.
pub struct ProbePool {
    prober: Arc<Prober>,
    workers: usize,
    observer: Arc<dyn RunObserver>,
}

impl ProbePool {
    /// `workers` is clamped to at least one.
    pub fn new(prober: Prober, workers: usize, observer: Arc<dyn RunObserver>) -> Self {
        Self {
            prober: Arc::new(prober),
            workers: workers.max(1),
            observer,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Probe every record and return them with results attached, sorted by host.
    ///
    /// Each task owns its output slot; results are merged only after the
    /// whole phase has been joined.
    pub async fn probe_all(&self, phase: &ProbePhase, records: Vec<HostRecord>) -> Vec<ProbedHost> {
        debug!(%phase, hosts = records.len(), workers = self.workers, "probing");

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();
        let mut pending = HashMap::new();

        for record in records {
            let prober = Arc::clone(&self.prober);
            let semaphore = Arc::clone(&semaphore);
            let task_record = record.clone();
            let handle = tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let probe = prober.probe_record(&task_record).await;
                ProbedHost {
                    record: task_record,
                    probe,
                }
            });
            pending.insert(handle.id(), record);
        }

        let mut probed = Vec::with_capacity(pending.len());
        while let Some(joined) = tasks.join_next().await {
            let host = match joined {
                Ok(host) => host,
                Err(e) => {
                    let Some(record) = pending.remove(&e.id()) else {
                        error!(%phase, error = %e, "probe task lost");
                        continue;
                    };
                    error!(%phase, host = %record.id, error = %e, "probe task aborted");
                    aborted(record, ProbeError::Aborted(e.to_string()))
                }
            };
            self.observer.probe_completed(phase, &host.probe);
            probed.push(host);
        }

        probed.sort_by(|a, b| a.id().cmp(b.id()));
        probed
    }
}

/// Result for a host whose probe task died: nothing is known about it.
fn aborted(record: HostRecord, err: ProbeError) -> ProbedHost {
    let probe = ProbeResult {
        host: record.id.clone(),
        address: record.address.clone(),
        ping_ok: false,
        ssh_port_open: false,
        login: LoginStatus::Unknown,
        user: record.credentials.user().to_string(),
        error: Some(err.to_string()),
    };
    ProbedHost { record, probe }
}
