//! # HTTP Server
//!
//! Combines the vault API, the public share route, the local blob endpoint
//! and health/metrics into one axum router.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::auth::JwtManager;
use super::blob_routes::blob_routes;
use super::config::HttpServerConfig;
use super::observability_routes::observability_routes;
use super::vault_routes::vault_routes;
use crate::blob::LocalBlobStore;
use crate::config::TierConfig;
use crate::errors::{VaultError, VaultResult};
use crate::observability::{log_event_with_fields, Event};
use crate::service::DynVaultService;

/// State shared by every handler
#[derive(Debug)]
pub struct AppState {
    pub service: Arc<DynVaultService>,
    pub jwt: JwtManager,
    /// Present when objects are served by this process
    pub blobs: Option<Arc<LocalBlobStore>>,
}

impl AppState {
    pub fn new(service: Arc<DynVaultService>, blobs: Option<Arc<LocalBlobStore>>) -> Self {
        let jwt = JwtManager::new(&service.config().auth);
        Self { service, jwt, blobs }
    }
}

/// Error body: `{"error", "kind", "code"}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    pub code: u16,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(err: VaultError) -> ApiError {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorResponse {
        error: err.to_string(),
        kind: err.kind().to_string(),
        code: status.as_u16(),
    };
    (status, Json(body))
}

/// Run a core call off the async runtime. Backend retries sleep.
pub(crate) async fn run_blocking<T, F>(state: &Arc<AppState>, call: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&DynVaultService) -> VaultResult<T> + Send + 'static,
{
    let service = Arc::clone(&state.service);
    tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|e| api_error(VaultError::Internal(format!("worker failed: {}", e))))?
        .map_err(api_error)
}

pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let config = state.service.config().http.clone();
        let router = build_router(Arc::new(state), &config);
        Self { config, router }
    }

    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// The router (for tests)
    pub fn router(self) -> Router {
        self.router
    }

    pub async fn start(self) -> std::io::Result<()> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("invalid address: {}", e))
        })?;

        let listener = TcpListener::bind(addr).await?;
        log_event_with_fields(Event::ServerStart, &[("addr", &addr.to_string())]);
        axum::serve(listener, self.router).await
    }
}

pub fn build_router(state: Arc<AppState>, config: &HttpServerConfig) -> Router {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = blob_body_limit(&state.service.config().tiers);

    Router::new()
        .merge(observability_routes(Arc::clone(&state)))
        .nest("/v1", vault_routes(Arc::clone(&state)))
        .nest(
            "/blob",
            blob_routes(state).layer(DefaultBodyLimit::max(body_limit)),
        )
        .layer(cors)
}

/// The blob endpoint must accept any file some tier admits
fn blob_body_limit(tiers: &TierConfig) -> usize {
    usize::try_from(tiers.largest_file_bytes()).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use crate::catalog::LocalCatalog;
    use crate::config::VaultConfig;
    use crate::service::VaultService;

    fn state() -> AppState {
        let blob: Arc<dyn crate::blob::BlobStore> = Arc::new(MemoryBlobStore::new());
        let catalog: Arc<dyn crate::catalog::MetadataCatalog> = Arc::new(LocalCatalog::in_memory());
        let config = VaultConfig::new("/tmp/unused", "s".repeat(32), "j".repeat(32));
        AppState::new(Arc::new(VaultService::new(config, blob, catalog)), None)
    }

    #[test]
    fn test_server_address_from_config() {
        let server = HttpServer::new(state());
        assert_eq!(server.socket_addr(), "127.0.0.1:54321");
    }

    #[test]
    fn test_blob_body_limit_follows_largest_tier() {
        let config = VaultConfig::new("/tmp/unused", "s".repeat(32), "j".repeat(32));
        let limit = blob_body_limit(&config.tiers) as u64;
        assert_eq!(limit, config.tiers.premium.max_file_bytes);
        assert!(limit >= config.tiers.free.max_file_bytes);
    }

    #[test]
    fn test_error_body() {
        let (status, Json(body)) = api_error(VaultError::ShareRevoked);
        assert_eq!(status, StatusCode::GONE);
        assert_eq!(body.kind, "share_revoked");
        assert_eq!(body.code, 410);
    }

    #[test]
    fn test_quota_error_maps_to_insufficient_storage() {
        let (status, _) = api_error(VaultError::QuotaExceeded { requested: 2, remaining: 1 });
        assert_eq!(status, StatusCode::INSUFFICIENT_STORAGE);
    }
}
