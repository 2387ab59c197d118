use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use autopatch_inventory::{AnsibleInventory, InventorySummary};

use crate::logging;

#[derive(Debug, Args)]
pub struct InventoryArgs {
    /// Config file (TOML).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Environment, e.g. qa or prod.
    #[arg(long)]
    pub env: Option<String>,

    /// Directory holding one inventory directory per environment.
    #[arg(long)]
    pub base_path: Option<PathBuf>,
}

pub fn inventory(args: InventoryArgs) -> anyhow::Result<()> {
    let mut config = super::load_config(args.config.as_deref())?;
    if let Some(env) = args.env {
        config.env = env;
    }
    if let Some(base_path) = args.base_path {
        config.base_path = base_path;
    }
    logging::init(config.no_color, None)?;

    let path = config.inventory_path();
    let inventory = AnsibleInventory::load(&path)
        .with_context(|| format!("failed to load inventory {}", path.display()))?;
    let summary = InventorySummary::build(&inventory, &config.env, &path, &config.cluster_suffix);

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
