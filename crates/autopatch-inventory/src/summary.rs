//! Inventory summary for dashboards: which host lives in which cluster.

use std::path::Path;

use serde::Serialize;

use autopatch_core::HostId;

use crate::provider::InventoryProvider;
use crate::topology::Topology;

#[derive(Debug, Clone, Serialize)]
pub struct InventorySummary {
    pub env: String,
    pub inventory_path: String,
    pub server_count: usize,
    pub cluster_count: usize,
    pub servers: Vec<ServerEntry>,
    pub clusters: Vec<ClusterEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerEntry {
    pub hostname: HostId,
    /// Cluster name, or `standalone`.
    pub cluster: String,
    pub env: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterEntry {
    pub name: String,
    pub nodes: usize,
    pub hosts: Vec<HostId>,
}

impl InventorySummary {
    pub fn build<I>(inventory: &I, env: &str, inventory_path: &Path, suffix: &str) -> Self
    where
        I: InventoryProvider + ?Sized,
    {
        let topology = Topology::classify(inventory, suffix);

        let servers: Vec<ServerEntry> = inventory
            .all_hosts()
            .into_iter()
            .map(|hostname| {
                let cluster = topology
                    .cluster_of(&hostname)
                    .unwrap_or(autopatch_core::STANDALONE)
                    .to_string();
                ServerEntry {
                    hostname,
                    cluster,
                    env: env.to_string(),
                }
            })
            .collect();

        let clusters: Vec<ClusterEntry> = topology
            .clusters
            .iter()
            .map(|(name, hosts)| ClusterEntry {
                name: name.clone(),
                nodes: hosts.len(),
                hosts: hosts.clone(),
            })
            .collect();

        Self {
            env: env.to_string(),
            inventory_path: inventory_path.display().to_string(),
            server_count: servers.len(),
            cluster_count: clusters.len(),
            servers,
            clusters,
        }
    }
}
