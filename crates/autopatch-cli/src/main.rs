//! autopatch: probe every host of an Ansible environment, then patch it.
//!
//! # Usage
//!
//! ```text
//! autopatch run --env qa --dry-run
//! autopatch inventory --env prod
//! ```

use clap::{Parser, Subcommand};

mod commands;
mod logging;
mod render;
mod report;

#[derive(Parser)]
#[command(
    name = "autopatch",
    about = "Autopatch: probe + patch runner for Ansible environments",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe all hosts, then patch standalone hosts and clusters.
    ///
    /// Clusters are patched only when every eligible member passed its
    /// probe. A JSON report is written to the report directory.
    Run(commands::run::RunArgs),
    /// Print the inventory summary (servers and clusters) as JSON.
    Inventory(commands::inventory::InventoryArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run::run(args).await,
        Commands::Inventory(args) => commands::inventory::inventory(args),
    }
}
