//! Playbook catalog: which playbook patches which group.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::debug;

use autopatch_core::{PlaybookConfig, STANDALONE};

#[derive(Debug, Clone)]
pub struct PlaybookCatalog {
    dir: PathBuf,
    standalone: String,
    default: String,
    clusters: BTreeMap<String, String>,
}

impl PlaybookCatalog {
    pub fn new(config: &PlaybookConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            standalone: config.standalone.clone(),
            default: config.default.clone(),
            clusters: config.clusters.clone(),
        }
    }

    /// Playbook for `group`: the standalone playbook for [`STANDALONE`],
    /// the cluster's own entry, or the default.
    pub fn resolve(&self, group: &str) -> PathBuf {
        let file = if group == STANDALONE {
            &self.standalone
        } else {
            self.clusters.get(group).unwrap_or(&self.default)
        };
        let playbook = self.dir.join(file);
        debug!(%group, playbook = %playbook.display(), "selected playbook");
        playbook
    }
}

impl Default for PlaybookCatalog {
    fn default() -> Self {
        Self::new(&PlaybookConfig::default())
    }
}
