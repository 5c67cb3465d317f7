//! CloudVault CLI entry point
//!
//! Parses arguments and dispatches via `cli::run`. On failure prints the
//! JSON error line, the message on stderr, and exits non-zero.

use cloudvault::cli;

fn main() {
    if let Err(e) = cli::run() {
        let _ = cli::write_error(e.code_str(), e.message());
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
