//! afetch CLI Library
//!
//! Fetches predicted protein structures from the AlphaFold database.
//!
//! # Overview
//!
//! - **Fetch**: Download the newest model version of one or more UniProt
//!   entries and load them into the session (`afetch fetch`)
//! - **Interactive**: Fill in a small form repeatedly (`afetch prompt`)
//! - **Local files**: List models already downloaded (`afetch cached`)
//! - **Configuration**: Manage CLI settings (`afetch config`)

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod api;
pub mod app;
pub mod batch;
pub mod commands;
pub mod config;
pub mod error;
pub mod fetch;
pub mod progress;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use app::App;
pub use batch::{FetchArgs, FETCH_ARG_KEYS};
pub use error::{CliError, Result};
pub use fetch::{FetchStatus, Fetcher};
pub use session::{Session, StructureLoader};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// afetch - AlphaFold2 structure fetcher
#[derive(Parser, Debug)]
#[command(name = "afetch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the CLI reference as Markdown
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch AlphaFold2 models by UniProt ID
    Fetch {
        /// UniProt IDs (e.g. P69905)
        #[arg(required = true)]
        codes: Vec<String>,

        /// Object name (defaults to each ID)
        #[arg(short, long, default_value = "")]
        name: String,

        /// Target state; 0 appends
        #[arg(long, default_value_t = 0)]
        state: i32,

        /// Refresh the view after loading
        #[arg(long, default_value_t = 1)]
        finish: i32,

        /// Discrete multi-state objects (negative: automatic)
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        discrete: i32,

        /// Split multi-model files into one object per model
        #[arg(long, default_value_t = -2, allow_negative_numbers = true)]
        multiplex: i32,

        /// Zoom onto loaded objects (negative: only the first one)
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        zoom: i32,

        /// Format: cif, pdb or pdb<N> (defaults to the configured one)
        #[arg(short = 't', long = "type", default_value = "")]
        format: String,

        /// Run in the background: 1 yes, 0 no, negative unless quiet
        #[arg(long = "async", default_value_t = 0, allow_negative_numbers = true)]
        async_: i32,

        /// Fetch directory (defaults to the configured one)
        #[arg(short, long, default_value = "")]
        path: String,

        /// Output file; '-' writes to stdout
        #[arg(short, long)]
        file: Option<String>,

        /// Suppress progress and warnings: 1 yes, 0 no (bare -q means 1)
        #[arg(short, long, default_value_t = 1, num_args = 0..=1, default_missing_value = "1")]
        quiet: i32,
    },

    /// Interactive fetch form
    Prompt,

    /// List downloaded models
    Cached {
        /// Directory to list (defaults to the configured fetch path)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

impl Commands {
    /// Fetch arguments for a `fetch` subcommand
    pub fn fetch_args(&self) -> Option<FetchArgs> {
        let Commands::Fetch {
            codes,
            name,
            state,
            finish,
            discrete,
            multiplex,
            zoom,
            format,
            async_,
            path,
            file,
            quiet,
        } = self
        else {
            return None;
        };

        Some(FetchArgs {
            code: codes.join(" "),
            name: name.clone(),
            state: *state,
            finish: *finish,
            discrete: *discrete,
            multiplex: *multiplex,
            zoom: *zoom,
            format: format.clone(),
            async_: *async_,
            path: path.clone(),
            file: file.clone(),
            quiet: *quiet,
        })
    }
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Get configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Set configuration value
    Set {
        /// Configuration key
        key: String,

        /// Configuration value
        value: String,
    },

    /// Show all configuration
    Show,

    /// Print the config file path
    Path,
}
