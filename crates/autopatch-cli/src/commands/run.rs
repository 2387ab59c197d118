use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use tracing::{error, info};

use autopatch_core::{PatchConfig, RunObserver, TracingObserver};
use autopatch_exec::{AnsiblePlaybookRunner, PlaybookCatalog};
use autopatch_inventory::AnsibleInventory;
use autopatch_probe::{ProbePool, Prober};
use autopatch_rollout::{PatchController, PipelineOptions, run_pipeline};

use crate::render::{self, Style};
use crate::{logging, report};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Config file (TOML). Flags override its values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Environment, e.g. qa or prod.
    #[arg(long)]
    pub env: Option<String>,

    /// Directory holding one inventory directory per environment.
    #[arg(long)]
    pub base_path: Option<PathBuf>,

    /// Run the playbooks in check mode.
    #[arg(long)]
    pub dry_run: bool,

    /// Number of parallel probes.
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// Timeout for ping and SSH checks, in seconds.
    #[arg(long)]
    pub probe_timeout: Option<f64>,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,

    /// Log file (DEBUG and above).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Directory for the JSON run report.
    #[arg(long)]
    pub report_dir: Option<PathBuf>,
}

impl RunArgs {
    /// Apply flags on top of the loaded config.
    pub fn apply(&self, config: &mut PatchConfig) {
        if let Some(env) = &self.env {
            config.env = env.clone();
        }
        if let Some(base_path) = &self.base_path {
            config.base_path = base_path.clone();
        }
        if let Some(workers) = self.max_workers {
            config.max_workers = workers;
        }
        if let Some(timeout) = self.probe_timeout {
            config.probe_timeout_secs = timeout;
        }
        if let Some(log_file) = &self.log_file {
            config.log_file = log_file.clone();
        }
        if let Some(report_dir) = &self.report_dir {
            config.report_dir = report_dir.clone();
        }
        config.dry_run |= self.dry_run;
        config.no_color |= self.no_color;
    }
}

pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let mut config = super::load_config(args.config.as_deref())?;
    args.apply(&mut config);
    logging::init(config.no_color, Some(&config.log_file))?;

    let credentials = config.resolve_credentials()?;
    let inventory_path = config.inventory_path();
    let inventory = AnsibleInventory::load(&inventory_path)
        .with_context(|| format!("failed to load inventory {}", inventory_path.display()))?;

    info!(
        env = %config.env,
        inventory = %inventory_path.display(),
        dry_run = config.dry_run,
        workers = config.worker_count(),
        "autopatch starting"
    );

    let observer: Arc<dyn RunObserver> = Arc::new(TracingObserver);
    let pool = ProbePool::new(
        Prober::system(config.probe_timeout()),
        config.worker_count(),
        observer.clone(),
    );
    let controller = PatchController::new(
        Arc::new(AnsiblePlaybookRunner::new(&inventory_path)),
        PlaybookCatalog::new(&config.playbooks),
        observer,
    )
    .with_dry_run(config.dry_run);
    let options = PipelineOptions {
        env: config.env.clone(),
        dry_run: config.dry_run,
        cluster_suffix: config.cluster_suffix.clone(),
    };

    let report = run_pipeline(
        &inventory,
        &credentials,
        &pool,
        Arc::new(controller),
        &options,
    )
    .await;

    let style = Style::new(!config.no_color);
    print!("{}", render::probe_tables(&report, style));
    print!("{}", render::outcomes(&report, style));
    print!("{}", render::summary(&report, style));

    match report::write_report(&config.report_dir, &report) {
        Ok(path) => println!("\nReport: {}", path.display()),
        Err(e) => error!(error = %e, dir = %config.report_dir.display(), "failed to write report"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: RunArgs,
    }

    #[test]
    fn flags_override_config() {
        let cli = TestCli::parse_from([
            "autopatch",
            "--env",
            "prod",
            "--max-workers",
            "8",
            "--probe-timeout",
            "1.5",
            "--dry-run",
        ]);
        let mut config = PatchConfig::default();
        cli.args.apply(&mut config);

        assert_eq!(config.env, "prod");
        assert_eq!(config.worker_count(), 8);
        assert_eq!(config.probe_timeout_secs, 1.5);
        assert!(config.dry_run);
        assert!(!config.no_color);
        assert_eq!(config.report_dir, PathBuf::from("reports"));
    }

    #[test]
    fn absent_flags_keep_config_values() {
        let cli = TestCli::parse_from(["autopatch"]);
        let mut config = PatchConfig {
            dry_run: true,
            max_workers: 4,
            ..PatchConfig::default()
        };
        cli.args.apply(&mut config);
        assert!(config.dry_run);
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.env, "qa");
    }
}
