//! apptrack - track third-party software updates
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
//!
//! Watches the editors of third-party products for new versions, downloads
//! and verifies their installers, asks for approval and publishes the
//! approved versions in deployment lists.
//!
//! # Lifecycle
//!
//! ```text
//! untracked --pull--> pulled --fetch--> fetched --approve--> approved --make--> applist-*.txt
//! ```
//!
//! # Store Layout
//!
//! ```text
//! <store>/
//! ├── catalog.json         # pulled, fetched and approved slots per product
//! ├── applist-<name>.txt   # deployment lists
//! └── <product>/           # downloaded installers
//! ```

pub mod cmd;
pub mod ui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use apptrack_core::schema::HashAlgorithm;

/// Configuration file read when `-c` is not given.
pub const DEFAULT_CONFIG: &str = "apptrack.toml";

#[derive(Debug, Parser)]
#[command(name = "apptrack")]
#[command(about = "Track, fetch and approve third-party software updates", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Log debug messages (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Look for new versions at the editors
    Pull,
    /// Download and verify the installers of pulled versions
    Fetch,
    /// Review fetched versions and approve them for deployment
    Approve {
        /// Approve every fetched version without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Regenerate the deployment lists from approved versions
    Make,
    /// Pull, fetch, approve and make in one go
    Run,
    /// Validate the configuration file
    Check,
    /// Show the catalog slots of every product
    Status,
    /// Compute file hashes (for feed authoring)
    #[command(hide = true)]
    Hash {
        /// Hash algorithm (sha1, sha256, sha512)
        #[arg(short, long, default_value = "sha256", value_parser = parse_algorithm)]
        algorithm: HashAlgorithm,
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn parse_algorithm(name: &str) -> Result<HashAlgorithm, String> {
    HashAlgorithm::from_name(name).ok_or_else(|| format!("unsupported hash algorithm '{name}'"))
}
