mod api;
mod cli;
mod client;
mod config;
mod context;

use anyhow::Result;
use clap::Parser; // needed for Cli::parse()
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use cli::commands::run_cli;
use cli::opts::Cli;
use config::AppConfig;

fn main() -> Result<()> {
    // Logs go to stderr so command output stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,learnhub=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let config = AppConfig::from_env().with_cli(&args);

    let rt = Runtime::new()?;
    rt.block_on(run_cli(args, config))
}
