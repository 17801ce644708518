use axum::{
    extract::{
        multipart::MultipartRejection, rejection::QueryRejection, Multipart, Query, Request,
        State,
    },
    Json,
};

use crate::error::{ApiResponse, AppError, Result};
use crate::ingest;
use crate::models::{FileRecord, IdQuery};
use crate::services::FileService;
use crate::AppState;

/// List files
/// GET /api/files
pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<FileRecord>>> {
    let files = FileService::list_files(&state.db).await?;
    Ok(Json(files))
}

/// Upload a file
/// POST /api/files (multipart, part "file")
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse>> {
    let multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;
    let store = state.storage.files();

    let ingested = ingest::ingest(multipart, store).await?;
    let file = FileService::create_file(&state.db, store, ingested).await?;

    Ok(Json(ApiResponse::created(
        file.id,
        "File uploaded successfully",
    )))
}

/// Rename a file
/// PUT /api/files?id=xxx (JSON or multipart body with newFileName)
pub async fn rename_file(
    State(state): State<AppState>,
    query: std::result::Result<Query<IdQuery>, QueryRejection>,
    req: Request,
) -> Result<Json<ApiResponse>> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    let store = state.storage.files();
    let ingested = ingest::parse_update_body(req, store).await?;
    FileService::rename_file(&state.db, store, query.id, ingested).await?;
    Ok(Json(ApiResponse::message("File updated successfully")))
}

/// Delete a file and its blob
/// DELETE /api/files?id=xxx
pub async fn delete_file(
    State(state): State<AppState>,
    query: std::result::Result<Query<IdQuery>, QueryRejection>,
) -> Result<Json<ApiResponse>> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    FileService::delete_file(&state.db, state.storage.files(), query.id).await?;
    Ok(Json(ApiResponse::message("File deleted successfully")))
}
