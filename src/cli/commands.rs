//! CLI command implementations
//!
//! Every command loads and validates the config file first. `serve` and
//! `reconcile` refuse to run against an uninitialized data directory.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::blob::BlobStore;
use crate::catalog::MetadataCatalog;
use crate::config::VaultConfig;
use crate::http_server::{AppState, HttpServer, JwtManager};
use crate::observability::{log_event_with_fields, Event};
use crate::service::{open_local, VaultService};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Main CLI entry point. The only function main.rs calls.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Serve { config } => serve(&config),
        Command::Reconcile { config } => reconcile(&config),
        Command::IssueToken { config, owner } => issue_token(&config, owner),
    }
}

fn load_config(path: &Path) -> CliResult<VaultConfig> {
    let config = VaultConfig::load(path)?;
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("path", &path.display().to_string()),
            ("data_dir", &config.data_dir),
        ],
    );
    Ok(config)
}

/// Create the data directory layout
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;

    if is_initialized(&config) {
        return Err(CliError::already_initialized());
    }

    let catalog_dir = config
        .catalog_path()
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.data_path().join("catalog"));
    for dir in [config.blob_root(), catalog_dir] {
        fs::create_dir_all(&dir).map_err(|e| {
            CliError::config_error(format!("Failed to create directory {:?}: {}", dir, e))
        })?;
    }

    write_response(json!({"initialized": true, "data_dir": config.data_dir}))
}

/// Boot the HTTP server over the local backends
pub fn serve(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    if !is_initialized(&config) {
        return Err(CliError::not_initialized());
    }

    let (blob, catalog) = open_local(&config)
        .map_err(|e| CliError::boot_failed(format!("Failed to open backends: {}", e)))?;
    let blob_store: Arc<dyn BlobStore> = Arc::clone(&blob) as Arc<dyn BlobStore>;
    let catalog: Arc<dyn MetadataCatalog> = catalog;
    let service = VaultService::new(config, blob_store, catalog);
    let server = HttpServer::new(AppState::new(Arc::new(service), Some(blob)));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Usage sweep plus backing-object audit, printed as JSON
pub fn reconcile(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    if !is_initialized(&config) {
        return Err(CliError::not_initialized());
    }

    let (blob, catalog) = open_local(&config)?;
    let service = VaultService::new(config, blob, catalog);
    let report = service.reconciler().run()?;

    write_response(serde_json::to_value(&report)?)
}

/// Mint a development bearer token
pub fn issue_token(config_path: &Path, owner: Uuid) -> CliResult<()> {
    let config = load_config(config_path)?;
    let token = JwtManager::new(&config.auth).issue_token(&owner)?;

    write_response(json!({
        "owner_id": owner,
        "access_token": token,
        "token_type": "bearer",
        "expires_in": config.auth.token_ttl_minutes * 60,
    }))
}

fn is_initialized(config: &VaultConfig) -> bool {
    config.blob_root().is_dir()
        && config
            .catalog_path()
            .parent()
            .map(Path::is_dir)
            .unwrap_or(false)
}
