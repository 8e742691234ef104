//! DBW CLI - Command line tool for exploring an observation database server.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "dbw-cli",
    version,
    about = "Observation explorer toolkit"
)]
struct Cli {
    /// Server root url (overrides the config file)
    #[arg(short, long, global = true)]
    url: Option<String>,

    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: dbw_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = dbw_cmd::config::load_config(cli.config.as_deref(), cli.url.as_deref())?;
    dbw_cmd::run(cli.command, config).await
}
