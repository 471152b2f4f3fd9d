use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::{header, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use bytes::Bytes;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{
    DeleteParams, DeleteResponse, DirectoryListing, DownloadParams, FolderParams, FolderResponse,
    ListParams, RenameParams, RenameResponse, UploadResponse,
};
use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::resolver::PathResolver;
use crate::upload::UploadPolicy;
use crate::vault::FileVault;

/// Shared state for all handlers: the confined vault and the upload rules.
#[derive(Clone)]
pub struct AppState {
    vault: Arc<FileVault>,
    policy: Arc<UploadPolicy>,
}

/// Build the application router from a config.
///
/// Handlers stay thin: parse the typed params, log, delegate to the vault,
/// let `ApiError` render the `{result:false,error}` body.
pub fn router(config: &ServerConfig) -> Router {
    let resolver = PathResolver::new(config.root_dir.clone());
    let state = AppState {
        vault: Arc::new(FileVault::new(resolver)),
        policy: Arc::new(UploadPolicy::from_config(config)),
    };

    // Body cap covers the file plus multipart framing and the path field.
    let body_limit = config.max_upload_bytes as usize + 64 * 1024;

    Router::new()
        .route("/", get(list))
        .route("/rename", put(rename))
        .route("/delete", delete(remove))
        .route("/folder", post(create_folder))
        .route("/download", get(download))
        .route("/upload", post(upload))
        .nest_service("/ui", ServeDir::new(&config.webui_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<DirectoryListing>, ApiError> {
    info!("list: {:?}", params.path);
    Ok(Json(state.vault.list(&params.path)?))
}

async fn rename(
    State(state): State<AppState>,
    Query(params): Query<RenameParams>,
) -> Result<Json<RenameResponse>, ApiError> {
    let old_path = params.old_path.ok_or(ApiError::MissingParam("oldPath"))?;
    let new_name = params.new_name.ok_or(ApiError::MissingParam("newName"))?;
    info!("rename: {:?} -> {:?}", old_path, new_name);
    Ok(Json(state.vault.rename(&old_path, &new_name)?))
}

async fn remove(
    State(state): State<AppState>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let path = params.path.ok_or(ApiError::MissingParam("path"))?;
    info!("delete: {:?}", path);
    Ok(Json(state.vault.delete(&path)?))
}

async fn create_folder(
    State(state): State<AppState>,
    Query(params): Query<FolderParams>,
) -> Result<Json<FolderResponse>, ApiError> {
    let name = params.name.ok_or(ApiError::MissingParam("name"))?;
    info!("create folder: {:?} in {:?}", name, params.path);
    Ok(Json(state.vault.create_folder(&params.path, &name)?))
}

async fn download(
    State(state): State<AppState>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, ApiError> {
    let path = params.path.ok_or(ApiError::MissingParam("path"))?;
    let (name, data) = state.vault.read_file(&path)?;

    let disposition = format!("attachment; filename=\"{}\"", header_safe(&name));
    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        ),
        (
            header::CONTENT_DISPOSITION,
            HeaderValue::from_str(&disposition)
                .map_err(|e| ApiError::Internal(anyhow::anyhow!("bad disposition header: {e}")))?,
        ),
    ];
    Ok((headers, data).into_response())
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut dir_path = String::new();
    let mut file: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Multipart(e.to_string()))?
    {
        match field.name() {
            Some("path") => {
                dir_path = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Multipart(e.to_string()))?;
            }
            Some("file") => {
                let original = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Multipart(e.to_string()))?;
                file = Some((original, data));
            }
            _ => {}
        }
    }

    let (original, data) = file.ok_or(ApiError::NoFile)?;
    if original.is_empty() {
        return Err(ApiError::NoFile);
    }
    info!("upload: {:?} ({} bytes) into {:?}", original, data.len(), dir_path);

    Ok(Json(state.vault.save_upload(
        &dir_path,
        &original,
        &data,
        &state.policy,
    )?))
}

/// Keep a filename usable inside a quoted Content-Disposition value.
fn header_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c == '"' || c == '\\' || !c.is_ascii_graphic() && c != ' ' {
                '_'
            } else {
                c
            }
        })
        .collect()
}
