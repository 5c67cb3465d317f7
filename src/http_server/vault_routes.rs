//! Vault HTTP Routes
//!
//! Authenticated `/v1` API plus the anonymous share resolution route.
//! Every handler resolves the caller from the bearer token and hands the
//! core call to `run_blocking`.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::server::{api_error, run_blocking, ApiError, AppState};
use crate::errors::VaultError;
use crate::model::{
    ExpirationPolicy, FileQuery, FileRecord, Folder, FolderFilter, OwnerId, ShareLink,
    SortDirection, SortField, StorageSummary, StorageUsage,
};
use crate::transfer::{ConfirmUpload, DownloadTicket, UploadTicket};

pub fn vault_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/uploads", post(request_upload_handler))
        .route("/uploads/confirm", post(confirm_upload_handler))
        .route("/files", get(list_files_handler))
        .route("/files/types", get(file_types_handler))
        .route("/files/:id", axum::routing::delete(delete_file_handler))
        .route("/files/:id/download", get(download_handler))
        .route("/files/:id/rename", post(rename_file_handler))
        .route("/files/:id/move", post(move_file_handler))
        .route("/files/:id/shares", post(create_share_handler))
        .route("/usage", get(usage_handler))
        .route("/folders", get(list_folders_handler).post(create_folder_handler))
        .route(
            "/folders/:id",
            patch(rename_folder_handler).delete(delete_folder_handler),
        )
        .route("/folders/:id/path", get(folder_path_handler))
        .route("/shares", get(list_shares_handler))
        .route("/shares/:id", axum::routing::delete(revoke_share_handler))
        .route("/shares/:id/extend", post(extend_share_handler))
        .route("/public/shares/:token", get(resolve_share_handler))
        .with_state(state)
}

fn owner(state: &AppState, headers: &HeaderMap) -> Result<OwnerId, ApiError> {
    state.jwt.authenticate(headers).map_err(api_error)
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct RequestUploadBody {
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    #[serde(default)]
    pub folder_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListFilesParams {
    /// `root` or a folder id; absent lists every file
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub sort: Option<SortField>,
    #[serde(default)]
    pub direction: Option<SortDirection>,
}

impl ListFilesParams {
    fn into_query(self) -> Result<FileQuery, VaultError> {
        let folder = match self.folder.as_deref() {
            None | Some("") => FolderFilter::Any,
            Some("root") => FolderFilter::Root,
            Some(id) => FolderFilter::In(
                Uuid::parse_str(id)
                    .map_err(|_| VaultError::InvalidInput(format!("invalid folder: {}", id)))?,
            ),
        };
        Ok(FileQuery {
            folder,
            search: self.search.filter(|s| !s.trim().is_empty()),
            content_type: self.content_type.filter(|s| !s.is_empty()),
            sort: self.sort.unwrap_or_default(),
            direction: self.direction.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct FilesListResponse {
    pub files: Vec<FileRecord>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct FileTypesResponse {
    pub types: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameBody {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct MoveBody {
    #[serde(default)]
    pub folder_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFolderBody {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ShareBody {
    pub expiration: ExpirationPolicy,
}

#[derive(Debug, Serialize)]
pub struct SharesListResponse {
    pub shares: Vec<ShareLink>,
    pub total: usize,
}

/// What an anonymous share holder sees. Owner and object key stay private.
#[derive(Debug, Serialize)]
pub struct PublicShareResponse {
    pub name: String,
    pub size_bytes: u64,
    pub content_type: String,
    pub download_url: String,
    pub download_expires_at: DateTime<Utc>,
    pub share_expires_at: Option<DateTime<Utc>>,
}

// ==================
// Transfers
// ==================

async fn request_upload_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<RequestUploadBody>,
) -> Result<(StatusCode, Json<UploadTicket>), ApiError> {
    let owner_id = owner(&state, &headers)?;
    let ticket = run_blocking(&state, move |svc| {
        svc.transfers().request_upload(
            &owner_id,
            &body.file_name,
            &body.content_type,
            body.size,
            body.folder_id,
        )
    })
    .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

async fn confirm_upload_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ConfirmUpload>,
) -> Result<Json<FileRecord>, ApiError> {
    let owner_id = owner(&state, &headers)?;
    let file = run_blocking(&state, move |svc| svc.transfers().confirm_upload(&owner_id, body)).await?;
    Ok(Json(file))
}

async fn download_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(file_id): Path<Uuid>,
) -> Result<Json<DownloadTicket>, ApiError> {
    let owner_id = owner(&state, &headers)?;
    let ticket = run_blocking(&state, move |svc| svc.transfers().request_download(&owner_id, &file_id)).await?;
    Ok(Json(ticket))
}

async fn delete_file_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(file_id): Path<Uuid>,
) -> Result<Json<StorageUsage>, ApiError> {
    let owner_id = owner(&state, &headers)?;
    let usage = run_blocking(&state, move |svc| svc.transfers().delete_file(&owner_id, &file_id)).await?;
    Ok(Json(usage))
}

// ==================
// Library
// ==================

async fn list_files_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ListFilesParams>,
) -> Result<Json<FilesListResponse>, ApiError> {
    let owner_id = owner(&state, &headers)?;
    let query = params.into_query().map_err(api_error)?;
    let files = run_blocking(&state, move |svc| svc.library().list_files(&owner_id, &query)).await?;
    Ok(Json(FilesListResponse {
        total: files.len(),
        files,
    }))
}

async fn file_types_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<FileTypesResponse>, ApiError> {
    let owner_id = owner(&state, &headers)?;
    let types = run_blocking(&state, move |svc| svc.library().file_types(&owner_id)).await?;
    Ok(Json(FileTypesResponse { types }))
}

async fn rename_file_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(file_id): Path<Uuid>,
    Json(body): Json<RenameBody>,
) -> Result<Json<FileRecord>, ApiError> {
    let owner_id = owner(&state, &headers)?;
    let file = run_blocking(&state, move |svc| {
        svc.library().rename_file(&owner_id, &file_id, &body.name)
    })
    .await?;
    Ok(Json(file))
}

async fn move_file_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(file_id): Path<Uuid>,
    Json(body): Json<MoveBody>,
) -> Result<Json<FileRecord>, ApiError> {
    let owner_id = owner(&state, &headers)?;
    let file = run_blocking(&state, move |svc| {
        svc.library().move_file(&owner_id, &file_id, body.folder_id)
    })
    .await?;
    Ok(Json(file))
}

async fn usage_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StorageSummary>, ApiError> {
    let owner_id = owner(&state, &headers)?;
    let summary = run_blocking(&state, move |svc| svc.library().storage_summary(&owner_id)).await?;
    Ok(Json(summary))
}

// ==================
// Folders
// ==================

async fn list_folders_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Folder>>, ApiError> {
    let owner_id = owner(&state, &headers)?;
    let folders = run_blocking(&state, move |svc| svc.library().list_folders(&owner_id)).await?;
    Ok(Json(folders))
}

async fn create_folder_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateFolderBody>,
) -> Result<(StatusCode, Json<Folder>), ApiError> {
    let owner_id = owner(&state, &headers)?;
    let folder = run_blocking(&state, move |svc| {
        svc.library().create_folder(&owner_id, &body.name, body.parent_id)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

async fn rename_folder_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(folder_id): Path<Uuid>,
    Json(body): Json<RenameBody>,
) -> Result<Json<Folder>, ApiError> {
    let owner_id = owner(&state, &headers)?;
    let folder = run_blocking(&state, move |svc| {
        svc.library().rename_folder(&owner_id, &folder_id, &body.name)
    })
    .await?;
    Ok(Json(folder))
}

async fn delete_folder_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(folder_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let owner_id = owner(&state, &headers)?;
    run_blocking(&state, move |svc| svc.library().delete_folder(&owner_id, &folder_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn folder_path_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(folder_id): Path<Uuid>,
) -> Result<Json<Vec<Folder>>, ApiError> {
    let owner_id = owner(&state, &headers)?;
    let path = run_blocking(&state, move |svc| svc.library().folder_path(&owner_id, &folder_id)).await?;
    Ok(Json(path))
}

// ==================
// Shares
// ==================

async fn create_share_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(file_id): Path<Uuid>,
    Json(body): Json<ShareBody>,
) -> Result<(StatusCode, Json<ShareLink>), ApiError> {
    let owner_id = owner(&state, &headers)?;
    let share = run_blocking(&state, move |svc| {
        svc.shares().create_share(&owner_id, &file_id, body.expiration)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(share)))
}

async fn list_shares_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SharesListResponse>, ApiError> {
    let owner_id = owner(&state, &headers)?;
    let shares = run_blocking(&state, move |svc| svc.shares().list_shares(&owner_id)).await?;
    Ok(Json(SharesListResponse {
        total: shares.len(),
        shares,
    }))
}

async fn extend_share_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(share_id): Path<Uuid>,
    Json(body): Json<ShareBody>,
) -> Result<Json<ShareLink>, ApiError> {
    let owner_id = owner(&state, &headers)?;
    let share = run_blocking(&state, move |svc| {
        svc.shares().extend_expiration(&owner_id, &share_id, body.expiration)
    })
    .await?;
    Ok(Json(share))
}

async fn revoke_share_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(share_id): Path<Uuid>,
) -> Result<Json<ShareLink>, ApiError> {
    let owner_id = owner(&state, &headers)?;
    let share = run_blocking(&state, move |svc| svc.shares().revoke(&owner_id, &share_id)).await?;
    Ok(Json(share))
}

/// Anonymous: the token is the only credential
async fn resolve_share_handler(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<PublicShareResponse>, ApiError> {
    let resolved = run_blocking(&state, move |svc| svc.resolve_share(&token)).await?;
    let file = resolved.download.file;
    Ok(Json(PublicShareResponse {
        name: file.name,
        size_bytes: file.size_bytes,
        content_type: file.content_type,
        download_url: resolved.download.capability.url,
        download_expires_at: resolved.download.expires_at,
        share_expires_at: resolved.share.expires_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_folder_parsing() {
        let any = ListFilesParams::default().into_query().unwrap();
        assert_eq!(any.folder, FolderFilter::Any);

        let root = ListFilesParams { folder: Some("root".into()), ..Default::default() };
        assert_eq!(root.into_query().unwrap().folder, FolderFilter::Root);

        let id = Uuid::new_v4();
        let inside = ListFilesParams { folder: Some(id.to_string()), ..Default::default() };
        assert_eq!(inside.into_query().unwrap().folder, FolderFilter::In(id));

        let bad = ListFilesParams { folder: Some("nope".into()), ..Default::default() };
        assert!(matches!(bad.into_query(), Err(VaultError::InvalidInput(_))));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let params = ListFilesParams { search: Some("  ".into()), ..Default::default() };
        assert_eq!(params.into_query().unwrap().search, None);
    }
}
