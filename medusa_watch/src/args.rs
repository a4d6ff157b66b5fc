use clap::{Parser, Subcommand};
use medusa_api::models::ShowScope;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about = "Follow manual episode searches on a Medusa server")]
pub struct Cli {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open a page and follow its searches until Ctrl-C (default)
    Watch {
        /// Page route as `controller/action`, e.g. `home/displayShow`
        #[arg(long)]
        page: Option<String>,
        /// Restrict to one show
        #[arg(long, value_name = "INDEXER:ID")]
        show: Option<ShowScope>,
    },
    /// Start a manual search for an episode and follow it until it finishes
    Search {
        indexer: String,
        series_id: i64,
        season: i32,
        episode: i32,
        /// Retry a failed download instead of a fresh search
        #[arg(long)]
        retry: bool,
        /// Accept the quality already on disk again when retrying
        #[arg(long, requires = "retry")]
        down_cur_quality: bool,
    },
    /// Search the indexers for a show by name
    Lookup {
        term: String,
        #[arg(long)]
        indexer: Option<i64>,
    },
}
