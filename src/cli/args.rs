//! CLI argument definitions using clap
//!
//! Commands:
//! - cloudvault init --config <path>
//! - cloudvault serve --config <path>
//! - cloudvault reconcile --config <path>
//! - cloudvault issue-token --config <path> --owner <uuid>

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

/// CloudVault - transfer and quota coordination for file vaults
#[derive(Parser, Debug)]
#[command(name = "cloudvault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data directory layout
    Init {
        #[arg(long, default_value = "./cloudvault.json")]
        config: PathBuf,
    },

    /// Run the HTTP API and the local blob endpoint
    Serve {
        #[arg(long, default_value = "./cloudvault.json")]
        config: PathBuf,
    },

    /// Recompute usage totals and audit backing objects
    Reconcile {
        #[arg(long, default_value = "./cloudvault.json")]
        config: PathBuf,
    },

    /// Mint a bearer token for an owner (development)
    IssueToken {
        #[arg(long, default_value = "./cloudvault.json")]
        config: PathBuf,

        #[arg(long)]
        owner: Uuid,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
