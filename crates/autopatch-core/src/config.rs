//! autopatch.toml configuration parser.
//!
//! Every key is optional. The CLI loads the file (if any) and then applies
//! its flags on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::host::{CredentialSet, Credentials};

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("no secret for credential user {user}: set `password` or export {env}")]
    MissingSecret { user: String, env: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    /// Environment identifier, e.g. `qa` or `prod`.
    pub env: String,
    /// Directory holding one inventory directory per environment.
    pub base_path: PathBuf,
    /// Run the update command in check mode.
    pub dry_run: bool,
    /// Probe worker pool size.
    pub max_workers: usize,
    pub probe_timeout_secs: f64,
    pub no_color: bool,
    pub log_file: PathBuf,
    pub report_dir: PathBuf,
    /// Group-name suffix marking a cluster.
    pub cluster_suffix: String,
    pub credentials: CredentialsConfig,
    pub playbooks: PlaybookConfig,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            env: "qa".to_string(),
            base_path: PathBuf::from("../../../Ansible/environments"),
            dry_run: false,
            max_workers: 2,
            probe_timeout_secs: 5.0,
            no_color: false,
            log_file: PathBuf::from("autopatch.log"),
            report_dir: PathBuf::from("reports"),
            cluster_suffix: "_cluster".to_string(),
            credentials: CredentialsConfig::default(),
            playbooks: PlaybookConfig::default(),
        }
    }
}

impl PatchConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `{base_path}/{env}/inventory`
    pub fn inventory_path(&self) -> PathBuf {
        self.base_path.join(&self.env).join("inventory")
    }

    /// Pool size, never below one worker.
    pub fn worker_count(&self) -> usize {
        self.max_workers.max(1)
    }

    pub fn probe_timeout(&self) -> Duration {
        if self.probe_timeout_secs.is_finite() && self.probe_timeout_secs > 0.0 {
            Duration::from_secs_f64(self.probe_timeout_secs)
        } else {
            Duration::from_secs(5)
        }
    }

    /// Resolve both credential pairs from the process environment.
    pub fn resolve_credentials(&self) -> ConfigResult<CredentialSet> {
        self.credentials.resolve_with(|name| std::env::var(name).ok())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub default: CredentialConfig,
    pub alternate: CredentialConfig,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            default: CredentialConfig {
                user: "ansible".to_string(),
                password: None,
                password_env: "AUTOPATCH_DEFAULT_PASSWORD".to_string(),
            },
            alternate: CredentialConfig {
                user: "KONTO".to_string(),
                password: None,
                password_env: "AUTOPATCH_ALTERNATE_PASSWORD".to_string(),
            },
        }
    }
}

impl CredentialsConfig {
    /// Resolve secrets through `lookup` (an environment accessor).
    pub fn resolve_with<F>(&self, lookup: F) -> ConfigResult<CredentialSet>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(CredentialSet {
            default: self.default.resolve_with(&lookup)?,
            alternate: self.alternate.resolve_with(&lookup)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    pub user: String,
    /// Inline secret. Takes precedence over `password_env`.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_env: String,
}

impl CredentialConfig {
    fn resolve_with<F>(&self, lookup: &F) -> ConfigResult<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = match &self.password {
            Some(p) => Some(p.clone()),
            None if !self.password_env.is_empty() => lookup(&self.password_env),
            None => None,
        };
        secret
            .map(|s| Credentials::new(&self.user, s))
            .ok_or_else(|| ConfigError::MissingSecret {
                user: self.user.clone(),
                env: self.password_env.clone(),
            })
    }
}

/// Which playbook patches which group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybookConfig {
    /// Directory relative playbook names are resolved against.
    pub dir: PathBuf,
    pub standalone: String,
    /// Used for clusters without their own entry.
    pub default: String,
    pub clusters: BTreeMap<String, String>,
}

impl Default for PlaybookConfig {
    fn default() -> Self {
        let clusters = [
            ("galera_cluster", "patch-galera.yml"),
            ("haproxy_cluster", "patch-haproxy.yml"),
            ("packetfence_cluster", "patch-packetfence.yml"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            dir: PathBuf::from("../../../Ansible/playbooks/patchning"),
            standalone: "patch-single-linux.yml".to_string(),
            default: "patch-clusters.yml".to_string(),
            clusters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_uses_defaults() {
        let config: PatchConfig = toml::from_str("").unwrap();
        assert_eq!(config.env, "qa");
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.cluster_suffix, "_cluster");
        assert_eq!(config.playbooks.clusters.len(), 3);
        assert_eq!(
            config.inventory_path(),
            PathBuf::from("../../../Ansible/environments/qa/inventory")
        );
    }

    #[test]
    fn parse_overrides() {
        let toml_str = r#"
env = "prod"
base_path = "/srv/ansible/environments"
max_workers = 0
probe_timeout_secs = 2.5

[credentials.default]
user = "deploy"
password_env = "DEPLOY_PW"

[playbooks]
standalone = "single.yml"

[playbooks.clusters]
redis_cluster = "patch-redis.yml"
"#;
        let config: PatchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.env, "prod");
        assert_eq!(config.worker_count(), 1);
        assert_eq!(config.probe_timeout(), Duration::from_millis(2500));
        assert_eq!(config.credentials.default.user, "deploy");
        assert_eq!(config.credentials.alternate.user, "KONTO");
        assert_eq!(config.playbooks.standalone, "single.yml");
        assert_eq!(config.playbooks.default, "patch-clusters.yml");
        assert_eq!(
            config.playbooks.clusters.get("redis_cluster").map(String::as_str),
            Some("patch-redis.yml")
        );
    }

    #[test]
    fn credentials_resolve_from_lookup() {
        let config = CredentialsConfig::default();
        let set = config
            .resolve_with(|name| match name {
                "AUTOPATCH_DEFAULT_PASSWORD" => Some("pw-default".to_string()),
                "AUTOPATCH_ALTERNATE_PASSWORD" => Some("pw-alt".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(set.default.user(), "ansible");
        assert_eq!(set.default.secret(), "pw-default");
        assert_eq!(set.alternate.secret(), "pw-alt");
    }

    #[test]
    fn inline_password_wins() {
        let mut config = CredentialsConfig::default();
        config.default.password = Some("inline".to_string());
        config.alternate.password = Some("inline-alt".to_string());
        let set = config.resolve_with(|_| Some("from-env".to_string())).unwrap();
        assert_eq!(set.default.secret(), "inline");
    }

    #[test]
    fn missing_secret_is_an_error() {
        let config = CredentialsConfig::default();
        let err = config.resolve_with(|_| None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret { ref user, .. } if user == "ansible"));
        assert!(err.to_string().contains("AUTOPATCH_DEFAULT_PASSWORD"));
    }

    #[test]
    fn from_file_reports_path_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autopatch.toml");
        std::fs::write(&path, "max_workers = \"many\"").unwrap();

        let err = PatchConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("autopatch.toml"));
    }
}
