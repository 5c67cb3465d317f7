//! Blob HTTP Routes
//!
//! The local backend's object endpoint. Requests carry no bearer token;
//! the capability's query string is the whole authorization.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

use super::server::{AppState, ErrorResponse};
use crate::blob::{BlobError, CapabilityMethod, LocalBlobStore, SignedRequest};

type BlobApiError = (StatusCode, Json<ErrorResponse>);

pub fn blob_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/:namespace/*key", get(get_object_handler).put(put_object_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct CapabilityParams {
    pub method: CapabilityMethod,
    pub expires: i64,
    pub signature: String,
}

fn blob_error(err: BlobError) -> BlobApiError {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = ErrorResponse {
        error: err.to_string(),
        kind: err.kind().to_string(),
        code: status.as_u16(),
    };
    (status, Json(body))
}

fn local_store(state: &AppState) -> Result<Arc<LocalBlobStore>, BlobApiError> {
    state.blobs.clone().ok_or_else(|| {
        blob_error(BlobError::Unavailable(
            "objects are not served by this process".to_string(),
        ))
    })
}

fn check(
    store: &LocalBlobStore,
    expected: CapabilityMethod,
    params: &CapabilityParams,
    namespace: &str,
    key: &str,
    content_type: Option<&str>,
) -> Result<(), BlobApiError> {
    if params.method != expected {
        return Err(blob_error(BlobError::InvalidSignature));
    }
    let request = SignedRequest {
        method: params.method,
        namespace,
        key,
        content_type,
        expires: params.expires,
    };
    store
        .verify_capability(&request, &params.signature, Utc::now())
        .map_err(blob_error)
}

async fn put_object_handler(
    State(state): State<Arc<AppState>>,
    Path((namespace, key)): Path<(String, String)>,
    Query(params): Query<CapabilityParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, BlobApiError> {
    let store = local_store(&state)?;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| blob_error(BlobError::ContentTypeMismatch))?
        .to_string();
    check(&store, CapabilityMethod::Put, &params, &namespace, &key, Some(&content_type))?;

    tokio::task::spawn_blocking(move || store.write_object(&namespace, &key, &body))
        .await
        .map_err(|e| blob_error(BlobError::Io(e.to_string())))?
        .map_err(blob_error)?;
    Ok(StatusCode::CREATED)
}

async fn get_object_handler(
    State(state): State<Arc<AppState>>,
    Path((namespace, key)): Path<(String, String)>,
    Query(params): Query<CapabilityParams>,
) -> Result<impl IntoResponse, BlobApiError> {
    let store = local_store(&state)?;
    check(&store, CapabilityMethod::Get, &params, &namespace, &key, None)?;

    let data = tokio::task::spawn_blocking(move || store.read_object(&namespace, &key))
        .await
        .map_err(|e| blob_error(BlobError::Io(e.to_string())))?
        .map_err(blob_error)?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], data))
}
