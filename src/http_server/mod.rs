//! # HTTP Server
//!
//! axum surface over `VaultService`.
//!
//! # Endpoints
//!
//! - `/health`, `/metrics` - liveness and counters
//! - `/v1/*` - authenticated vault API (bearer JWT)
//! - `/v1/public/shares/:token` - anonymous share resolution
//! - `/blob/:namespace/*key` - local object transfers under a signed capability

pub mod auth;
pub mod blob_routes;
pub mod config;
pub mod observability_routes;
pub mod server;
pub mod vault_routes;

pub use auth::JwtManager;
pub use config::HttpServerConfig;
pub use server::{build_router, AppState, ErrorResponse, HttpServer};
