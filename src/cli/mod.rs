//! CLI module for CloudVault
//!
//! - init: create the data directory layout
//! - serve: run the HTTP API
//! - reconcile: usage sweep and backing-object audit
//! - issue-token: mint a development bearer token

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{init, issue_token, reconcile, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
