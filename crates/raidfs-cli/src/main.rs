mod cli;
mod fs;
mod metrics_runtime;
mod mkfs;
mod mount;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Mkfs(args) => mkfs::run_mkfs(&args),
        Command::Mount(args) => mount::run_mount(&args),
    }
}
