//! CLI argument definitions for storyboard.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Storyboard - Turn a spreadsheet of stories into an operational view.
///
/// Upload a story sheet with `sbd upload`, then read the overdue, at-risk and
/// need-to-start lists with `sbd report`.
#[derive(Parser, Debug)]
#[command(name = "sbd")]
#[command(author, version, about = "Operational view over a spreadsheet of stories", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Path to config.toml (default: <config_dir>/storyboard/config.toml)
    #[arg(long = "config", global = true, env = "SBD_CONFIG")]
    pub config_path: Option<PathBuf>,

    /// Directory for uploads and analysis results.
    /// Can also be set via SBD_DATA_DIR environment variable.
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze the most recent upload (or a local file) and save the report
    Analyze {
        /// Analyze this file instead of the latest upload (not saved)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Reference time, RFC 3339 (default: now)
        #[arg(long)]
        now: Option<String>,

        /// Print the report without saving it
        #[arg(long)]
        no_save: bool,
    },

    /// Upload a story sheet (.csv, .xlsx, .xls) and analyze it
    Upload {
        /// Path to the story sheet
        path: PathBuf,

        /// Store the file without running the analysis
        #[arg(long)]
        no_analyze: bool,

        /// Reference time, RFC 3339 (default: now)
        #[arg(long)]
        now: Option<String>,
    },

    /// Check a story sheet for missing ids, descriptions and due dates
    Validate {
        /// Path to the story sheet
        path: PathBuf,
    },

    /// Show the most recently saved analysis
    Report,

    /// Story listing and grouping commands
    Stories {
        #[command(subcommand)]
        command: StoriesCommands,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show version and build information
    Version,

    /// Start the HTTP API server with the daily analysis schedule
    #[cfg(feature = "server")]
    Serve {
        /// Address to bind (default: 127.0.0.1)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (default: 3001)
        #[arg(short, long)]
        port: Option<u16>,

        /// Disable the daily scheduled analysis
        #[arg(long)]
        no_schedule: bool,
    },
}

/// Story subcommands
#[derive(Subcommand, Debug)]
pub enum StoriesCommands {
    /// List all stories
    List {
        /// Read this file instead of the latest upload
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Show one story by id
    Show {
        /// Story id (e.g., S-101)
        id: String,

        /// Read this file instead of the latest upload
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Group stories by project
    ByProject {
        /// Read this file instead of the latest upload
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Group stories by epic
    ByEpic {
        /// Read this file instead of the latest upload
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show resolved settings and where each value came from
    Show,
}
