//! Topology classifier: standalone hosts vs. named clusters.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use autopatch_core::HostId;

use crate::provider::InventoryProvider;

/// The host set split into clusters and standalone hosts.
///
/// Every inventory host appears exactly once: either in one cluster's
/// member list or in `standalone`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    /// Cluster name → sorted members.
    pub clusters: BTreeMap<String, Vec<HostId>>,
    /// Sorted.
    pub standalone: Vec<HostId>,
}

impl Topology {
    /// Classify the provider's hosts using `suffix` as the cluster marker.
    ///
    /// A host listed in several cluster groups stays in the first one (by
    /// name) and is dropped from the rest.
    pub fn classify<I>(inventory: &I, suffix: &str) -> Self
    where
        I: InventoryProvider + ?Sized,
    {
        let mut claimed: BTreeMap<HostId, String> = BTreeMap::new();
        let mut clusters = BTreeMap::new();

        for group in inventory.group_names() {
            if !group.ends_with(suffix) {
                continue;
            }
            let mut members = Vec::new();
            for host in inventory.hosts_in_group(&group) {
                if let Some(owner) = claimed.get(&host) {
                    warn!(%host, cluster = %group, owner = %owner, "host already belongs to another cluster, ignoring");
                    continue;
                }
                claimed.insert(host.clone(), group.clone());
                members.push(host);
            }
            members.sort();
            members.dedup();
            debug!(cluster = %group, members = members.len(), "cluster group");
            clusters.insert(group, members);
        }

        let standalone: Vec<HostId> = inventory
            .all_hosts()
            .into_iter()
            .filter(|h| !claimed.contains_key(h))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Self {
            clusters,
            standalone,
        }
    }

    /// Name of the cluster `host` belongs to, if any.
    pub fn cluster_of(&self, host: &str) -> Option<&str> {
        self.clusters
            .iter()
            .find(|(_, members)| members.iter().any(|m| m == host))
            .map(|(name, _)| name.as_str())
    }

    pub fn host_count(&self) -> usize {
        self.standalone.len() + self.clusters.values().map(Vec::len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::StaticInventory;
    use crate::provider::CLUSTER_SUFFIX;

    fn inventory() -> StaticInventory {
        StaticInventory::new()
            .with_group("web", &["web02", "web01"])
            .with_group("db_cluster", &["d2", "d1"])
            .with_group("lb_cluster", &["lb1", "lb2"])
            .with_group("all_linux", &["web01", "d1", "lb1", "solo"])
    }

    #[test]
    fn classify_partitions_hosts() {
        let inv = inventory();
        let topo = Topology::classify(&inv, CLUSTER_SUFFIX);

        assert_eq!(topo.clusters.len(), 2);
        assert_eq!(topo.clusters["db_cluster"], vec!["d1", "d2"]);
        assert_eq!(topo.clusters["lb_cluster"], vec!["lb1", "lb2"]);
        assert_eq!(topo.standalone, vec!["solo", "web01", "web02"]);

        // Standalone and cluster members never overlap and cover all hosts.
        let mut union: BTreeSet<HostId> = topo.standalone.iter().cloned().collect();
        for members in topo.clusters.values() {
            for m in members {
                assert!(!topo.standalone.contains(m));
                assert!(union.insert(m.clone()), "{m} appears twice");
            }
        }
        let all: BTreeSet<HostId> = inv.all_hosts().into_iter().collect();
        assert_eq!(union, all);
        assert_eq!(topo.host_count(), all.len());
    }

    #[test]
    fn host_in_two_clusters_stays_in_first() {
        let inv = StaticInventory::new()
            .with_group("a_cluster", &["shared", "a1"])
            .with_group("b_cluster", &["shared", "b1"]);
        let topo = Topology::classify(&inv, CLUSTER_SUFFIX);

        assert_eq!(topo.clusters["a_cluster"], vec!["a1", "shared"]);
        assert_eq!(topo.clusters["b_cluster"], vec!["b1"]);
        assert_eq!(topo.cluster_of("shared"), Some("a_cluster"));
        assert!(topo.standalone.is_empty());
    }

    #[test]
    fn custom_suffix() {
        let inv = inventory();
        let topo = Topology::classify(&inv, "_linux");
        assert_eq!(topo.clusters.keys().collect::<Vec<_>>(), vec!["all_linux"]);
        assert!(topo.standalone.contains(&"d2".to_string()));
        assert_eq!(topo.cluster_of("web02"), None);
    }

    #[test]
    fn provider_defaults_use_cluster_suffix() {
        let inv = inventory();
        assert_eq!(inv.cluster_groups().len(), 2);
        assert_eq!(inv.standalone_hosts(), vec!["solo", "web01", "web02"]);
    }
}
