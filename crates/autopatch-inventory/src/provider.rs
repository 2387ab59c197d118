//! The inventory seam consumed by the orchestrator.

use std::collections::BTreeMap;

use autopatch_core::{HostId, HostVars};

use crate::topology::Topology;

/// Group-name suffix that marks a cluster.
pub const CLUSTER_SUFFIX: &str = "_cluster";

/// Source of hosts, host variables and group membership.
pub trait InventoryProvider: Send + Sync {
    /// Every host in the inventory, sorted.
    fn all_hosts(&self) -> Vec<HostId>;

    /// Variables for `host`. Empty for unknown hosts.
    fn host_vars(&self, host: &str) -> HostVars;

    /// Members of `group`, including members of its child groups. Sorted.
    fn hosts_in_group(&self, group: &str) -> Vec<HostId>;

    /// Every group name, sorted.
    fn group_names(&self) -> Vec<String>;

    /// Cluster groups under the default suffix.
    fn cluster_groups(&self) -> BTreeMap<String, Vec<HostId>> {
        Topology::classify(self, CLUSTER_SUFFIX).clusters
    }

    /// Hosts outside every cluster group, under the default suffix.
    fn standalone_hosts(&self) -> Vec<HostId> {
        Topology::classify(self, CLUSTER_SUFFIX).standalone
    }
}
