mod artifact;
mod auth;
mod cli;
mod config;
mod error;
mod github;
mod output;
mod snapshot;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting SiteSnap");
    cli.execute().await?;

    Ok(())
}
