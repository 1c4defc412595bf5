use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use quotesync_core::Resolution;

#[derive(Parser)]
#[command(name = "quotes")]
#[command(about = "Collect quotes and keep them in sync with a remote store")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to sync settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new quote
    #[command(alias = "new")]
    Add {
        /// Quote text (read from stdin when omitted)
        text: Vec<String>,
        /// Quote category
        #[arg(short, long)]
        category: String,
    },
    /// List quotes
    List {
        /// Only show quotes in this category
        #[arg(short, long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a random quote
    Random {
        /// Category to pick from ("all" for every category); remembered for next time
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List categories
    Categories,
    /// Export quotes as JSON
    Export {
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Import quotes from a JSON export
    Import {
        /// JSON file to import
        path: PathBuf,
    },
    /// Push local quotes, fetch remote ones and merge them
    Sync {
        /// Keep syncing on the configured interval until interrupted
        #[arg(long)]
        watch: bool,
    },
    /// List conflicts detected by the last sync
    Conflicts {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Override how a conflict was resolved
    Resolve {
        /// Local quote ID, unique ID prefix, or "all"
        target: String,
        /// Which category to keep
        #[arg(long, value_enum)]
        keep: KeepSide,
    },
    /// Show or update sync settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum KeepSide {
    Local,
    Remote,
}

impl From<KeepSide> for Resolution {
    fn from(side: KeepSide) -> Self {
        match side {
            KeepSide::Local => Self::KeepLocal,
            KeepSide::Remote => Self::KeepRemote,
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print effective settings
    Show,
    /// Update settings file
    Set {
        /// Remote API base URL
        #[arg(long, value_name = "URL")]
        remote_url: Option<String>,
        /// Number of remote items fetched per sync
        #[arg(long)]
        fetch_limit: Option<usize>,
        /// Seconds between automatic syncs
        #[arg(long)]
        interval_secs: Option<u64>,
        /// Seconds before a sync cycle is abandoned
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Prefix for categories of remote items
        #[arg(long)]
        category_prefix: Option<String>,
    },
}
