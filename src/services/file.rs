use std::path::Path;

use crate::collections::FileCollection;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::ingest::Ingested;
use crate::models::{FileRecord, NewFileRecord};
use crate::storage::BlobStore;

/// Part name carrying the uploaded file
const FILE_PART: &[&str] = &["file"];
const NEW_NAME_FIELDS: &[&str] = &["newFileName", "fileName"];

/// File catalog service
pub struct FileService;

impl FileService {
    /// List every file record
    pub async fn list_files(db: &Database) -> Result<Vec<FileRecord>> {
        FileCollection::find(db).await
    }

    /// Record an upload whose blob has already been written.
    ///
    /// On any failure the blob is removed again, so a rejected or unrecorded
    /// upload does not stay on disk.
    pub async fn create_file(
        db: &Database,
        store: &BlobStore,
        ingested: Ingested,
    ) -> Result<FileRecord> {
        match Self::commit_upload(db, &ingested).await {
            Ok(file) => {
                tracing::info!("File {} stored at {}", file.id, file.file_path);
                Ok(file)
            }
            Err(e) => {
                ingested.discard(store).await;
                Err(e)
            }
        }
    }

    async fn commit_upload(db: &Database, ingested: &Ingested) -> Result<FileRecord> {
        let file = ingested
            .file(FILE_PART)?
            .ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;

        let (Some(_), Some(display_name)) = (file.resolved_name(), file.display_name()) else {
            return Err(AppError::Validation("Invalid file data".to_string()));
        };

        FileCollection::insert_one(
            db,
            NewFileRecord {
                file_name: display_name.to_string(),
                file_path: file.stored_path.to_string_lossy().into_owned(),
            },
        )
        .await
    }

    /// Rename a file. The id comes from the query string, or from the body when the
    /// query has none.
    pub async fn rename_file(
        db: &Database,
        store: &BlobStore,
        query_id: Option<String>,
        ingested: Ingested,
    ) -> Result<()> {
        let id = query_id
            .filter(|id| !id.is_empty())
            .or_else(|| ingested.field(&["id"]).map(|s| s.to_string()))
            .filter(|id| !id.is_empty());
        let new_name = ingested
            .field(NEW_NAME_FIELDS)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        // Renaming never takes a file; drop anything that was uploaded with the form
        ingested.discard(store).await;

        let (Some(id), Some(new_name)) = (id, new_name) else {
            return Err(AppError::Validation(
                "Missing id or newFileName".to_string(),
            ));
        };

        let result = FileCollection::update_one(db, &id, &new_name).await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound("File not found".to_string()));
        }

        tracing::info!("File {} renamed to {}", id, new_name);
        Ok(())
    }

    /// Delete the blob, then the record. If the blob cannot be removed the record is
    /// kept so the delete can be retried.
    pub async fn delete_file(db: &Database, store: &BlobStore, id: Option<String>) -> Result<()> {
        let id = id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Validation("Missing file id".to_string()))?;

        let file = FileCollection::find_one(db, &id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        store.remove(Path::new(&file.file_path)).await?;

        let result = FileCollection::delete_one(db, &id).await?;
        if result.deleted_count == 0 {
            return Err(AppError::NotFound("File not found".to_string()));
        }

        tracing::info!("File {} deleted", id);
        Ok(())
    }
}
