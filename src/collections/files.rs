use chrono::Utc;
use uuid::Uuid;

use super::{DeleteResult, UpdateResult};
use crate::db::Database;
use crate::error::Result;
use crate::models::{FileRecord, NewFileRecord};

/// The `files` collection
pub struct FileCollection;

impl FileCollection {
    pub async fn insert_one(db: &Database, new: NewFileRecord) -> Result<FileRecord> {
        let mut conn = db.acquire().await?;
        let record = FileRecord {
            id: Uuid::new_v4().to_string(),
            file_name: new.file_name,
            file_path: new.file_path,
            upload_date: Utc::now().to_rfc3339(),
        };

        sqlx::query(
            "INSERT INTO files (id, file_name, file_path, upload_date) VALUES (?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.file_name)
        .bind(&record.file_path)
        .bind(&record.upload_date)
        .execute(&mut *conn)
        .await?;

        Ok(record)
    }

    pub async fn find(db: &Database) -> Result<Vec<FileRecord>> {
        let mut conn = db.acquire().await?;
        let files = sqlx::query_as("SELECT id, file_name, file_path, upload_date FROM files")
            .fetch_all(&mut *conn)
            .await?;
        Ok(files)
    }

    pub async fn find_one(db: &Database, id: &str) -> Result<Option<FileRecord>> {
        let mut conn = db.acquire().await?;
        let file = sqlx::query_as(
            "SELECT id, file_name, file_path, upload_date FROM files WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(file)
    }

    /// Rename; the only mutable field of a file record
    pub async fn update_one(db: &Database, id: &str, file_name: &str) -> Result<UpdateResult> {
        let mut conn = db.acquire().await?;
        let result = sqlx::query("UPDATE files SET file_name = ? WHERE id = ?")
            .bind(file_name)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(UpdateResult {
            matched_count: result.rows_affected(),
        })
    }

    pub async fn delete_one(db: &Database, id: &str) -> Result<DeleteResult> {
        let mut conn = db.acquire().await?;
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(DeleteResult {
            deleted_count: result.rows_affected(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_temp;

    fn new_file(name: &str, path: &str) -> NewFileRecord {
        NewFileRecord {
            file_name: name.to_string(),
            file_path: path.to_string(),
        }
    }

    #[tokio::test]
    async fn test_crud_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_temp(dir.path()).await;

        assert!(FileCollection::find(&db).await.unwrap().is_empty());

        let created = FileCollection::insert_one(&db, new_file("a.pdf", "/up/1-a.pdf"))
            .await
            .unwrap();
        let found = FileCollection::find_one(&db, &created.id).await.unwrap();
        assert_eq!(found.as_ref(), Some(&created));

        let updated = FileCollection::update_one(&db, &created.id, "b.pdf").await.unwrap();
        assert_eq!(updated.matched_count, 1);
        let renamed = FileCollection::find_one(&db, &created.id).await.unwrap().unwrap();
        assert_eq!(renamed.file_name, "b.pdf");
        assert_eq!(renamed.upload_date, created.upload_date);
        assert_eq!(renamed.file_path, created.file_path);

        let deleted = FileCollection::delete_one(&db, &created.id).await.unwrap();
        assert_eq!(deleted.deleted_count, 1);
        assert!(FileCollection::find_one(&db, &created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_id_matches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_temp(dir.path()).await;

        let updated = FileCollection::update_one(&db, "missing", "x").await.unwrap();
        assert_eq!(updated.matched_count, 0);
        let deleted = FileCollection::delete_one(&db, "missing").await.unwrap();
        assert_eq!(deleted.deleted_count, 0);
    }

    #[tokio::test]
    async fn test_two_records_cannot_share_a_path() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_temp(dir.path()).await;

        FileCollection::insert_one(&db, new_file("a", "/up/1-a")).await.unwrap();
        let second = FileCollection::insert_one(&db, new_file("b", "/up/1-a")).await;
        assert!(second.is_err());
        assert_eq!(FileCollection::find(&db).await.unwrap().len(), 1);
    }
}
