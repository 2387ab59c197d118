//! Ansible inventory loader.
//!
//! Pipeline:
//! 1. Invoke `ansible-inventory -i <path> --list`
//! 2. Parse the JSON document: one object per group (`hosts`, `children`)
//!    plus `_meta.hostvars` with the merged variables of every host
//! 3. Answer provider queries from the parsed document
//!
//! Group membership follows `children` transitively, like Ansible does.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::{debug, info};

use autopatch_core::{HostId, HostVars};

use crate::error::{InventoryError, InventoryResult};
use crate::provider::InventoryProvider;

/// Program used to render the inventory.
pub const INVENTORY_PROGRAM: &str = "ansible-inventory";

#[derive(Debug, Default, Deserialize)]
struct ListDocument {
    #[serde(rename = "_meta", default)]
    meta: Meta,
    #[serde(flatten)]
    groups: BTreeMap<String, GroupEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct Meta {
    #[serde(default)]
    hostvars: BTreeMap<HostId, HostVars>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GroupEntry {
    #[serde(default)]
    hosts: Vec<HostId>,
    #[serde(default)]
    children: Vec<String>,
}

/// Inventory rendered by `ansible-inventory --list`.
#[derive(Debug, Clone)]
pub struct AnsibleInventory {
    path: PathBuf,
    hostvars: BTreeMap<HostId, HostVars>,
    groups: BTreeMap<String, GroupEntry>,
}

impl AnsibleInventory {
    /// Load the inventory at `path` with the system `ansible-inventory`.
    pub fn load(path: &Path) -> InventoryResult<Self> {
        Self::load_with_program(INVENTORY_PROGRAM, path)
    }

    pub fn load_with_program(program: &str, path: &Path) -> InventoryResult<Self> {
        debug!(%program, path = %path.display(), "rendering inventory");

        let output = Command::new(program)
            .arg("-i")
            .arg(path)
            .arg("--list")
            .output()
            .map_err(|source| InventoryError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(InventoryError::Command {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let inventory = Self::from_json(path, &String::from_utf8_lossy(&output.stdout))?;
        info!(
            path = %path.display(),
            hosts = inventory.hostvars.len(),
            groups = inventory.groups.len(),
            "inventory loaded"
        );
        Ok(inventory)
    }

    /// Parse an `ansible-inventory --list` document.
    pub fn from_json(path: &Path, json: &str) -> InventoryResult<Self> {
        let doc: ListDocument = serde_json::from_str(json)?;
        Ok(Self {
            path: path.to_path_buf(),
            hostvars: doc.meta.hostvars,
            groups: doc.groups,
        })
    }

    /// Inventory source this was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn collect_members(&self, group: &str, visited: &mut BTreeSet<String>, out: &mut BTreeSet<HostId>) {
        if !visited.insert(group.to_string()) {
            return;
        }
        let Some(entry) = self.groups.get(group) else {
            return;
        };
        out.extend(entry.hosts.iter().cloned());
        for child in &entry.children {
            self.collect_members(child, visited, out);
        }
    }
}

impl InventoryProvider for AnsibleInventory {
    fn all_hosts(&self) -> Vec<HostId> {
        let mut hosts: BTreeSet<HostId> = self.hostvars.keys().cloned().collect();
        for entry in self.groups.values() {
            hosts.extend(entry.hosts.iter().cloned());
        }
        hosts.into_iter().collect()
    }

    fn host_vars(&self, host: &str) -> HostVars {
        self.hostvars.get(host).cloned().unwrap_or_default()
    }

    fn hosts_in_group(&self, group: &str) -> Vec<HostId> {
        let mut visited = BTreeSet::new();
        let mut members = BTreeSet::new();
        self.collect_members(group, &mut visited, &mut members);
        members.into_iter().collect()
    }

    fn group_names(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }
}
