//! In-memory inventory.

use std::collections::{BTreeMap, BTreeSet};

use autopatch_core::{HostId, HostVars};

use crate::provider::InventoryProvider;

/// Hosts and groups held in memory.
///
/// Groups are flat: no child groups.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    hosts: BTreeMap<HostId, HostVars>,
    groups: BTreeMap<String, BTreeSet<HostId>>,
}

impl StaticInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host, replacing its variables if it already exists.
    pub fn with_host(mut self, host: &str, vars: HostVars) -> Self {
        self.hosts.insert(host.to_string(), vars);
        self
    }

    /// Add a group. Members not yet known are added with no variables.
    pub fn with_group(mut self, group: &str, members: &[&str]) -> Self {
        let entry = self.groups.entry(group.to_string()).or_default();
        for m in members {
            entry.insert(m.to_string());
            self.hosts.entry(m.to_string()).or_default();
        }
        self
    }
}

impl InventoryProvider for StaticInventory {
    fn all_hosts(&self) -> Vec<HostId> {
        self.hosts.keys().cloned().collect()
    }

    fn host_vars(&self, host: &str) -> HostVars {
        self.hosts.get(host).cloned().unwrap_or_default()
    }

    fn hosts_in_group(&self, group: &str) -> Vec<HostId> {
        self.groups
            .get(group)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn group_names(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }
}
