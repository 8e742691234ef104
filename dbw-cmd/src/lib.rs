//! Command implementations for the DBW explorer CLI.
//!
//! Every command connects to a running explorer server, loads the explorer
//! state with the same `ExplorerSession` the web app uses (markers go to a
//! recording layer) and prints the result.

use clap::Subcommand;
use dbw_sync::ExplorerConfig;

pub mod config;
pub mod explore;
pub mod print;

#[derive(Subcommand)]
pub enum Command {
    /// Show filter fields, station counts and the value count
    Init,

    /// Change filter fields and show the resulting state
    Filter {
        /// Items as key=value: rep_memo, var, level, trange, ana_id,
        /// bounds=south,west,north,east, datemin, datemax. An empty value
        /// removes the filter.
        #[arg(value_name = "KEY=VALUE", required = true)]
        items: Vec<String>,
    },

    /// Print the values matching the current filter as CSV
    Data {
        /// Number of rows to fetch
        #[arg(short, long, conflicts_with = "unlimited")]
        limit: Option<u32>,

        /// Fetch every matching row
        #[arg(long)]
        unlimited: bool,
    },

    /// Show a station and its station variables
    Station {
        /// Station id (ana_id)
        id: i64,
    },

    /// Download the values matching the current filter
    Export {
        /// csv, bufr or crex
        format: String,

        /// Output file
        #[arg(short, long)]
        output: String,
    },
}

pub async fn run(command: Command, config: ExplorerConfig) -> anyhow::Result<()> {
    match command {
        Command::Init => explore::run_init(config).await,
        Command::Filter { items } => explore::run_filter(config, &items).await,
        Command::Data { limit, unlimited } => {
            let limit = if unlimited { Some(None) } else { limit.map(Some) };
            explore::run_data(config, limit).await
        }
        Command::Station { id } => explore::run_station(config, id).await,
        Command::Export { format, output } => explore::run_export(config, &format, &output).await,
    }
}
