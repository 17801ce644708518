use chrono::Utc;
use uuid::Uuid;

use super::{DeleteResult, UpdateResult};
use crate::db::Database;
use crate::error::Result;
use crate::models::{NewPartnerRecord, PartnerRecord, PartnerUpdate};

const COLUMNS: &str = "id, name, website, description, logo_file, upload_date";

/// The `partenaires` collection
pub struct PartnerCollection;

impl PartnerCollection {
    pub async fn insert_one(db: &Database, new: NewPartnerRecord) -> Result<PartnerRecord> {
        let mut conn = db.acquire().await?;
        let record = PartnerRecord {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            website: new.website,
            description: new.description,
            logo_file: new.logo_file,
            upload_date: Utc::now().to_rfc3339(),
        };

        sqlx::query(
            r#"
            INSERT INTO partenaires (id, name, website, description, logo_file, upload_date)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.website)
        .bind(&record.description)
        .bind(&record.logo_file)
        .bind(&record.upload_date)
        .execute(&mut *conn)
        .await?;

        Ok(record)
    }

    pub async fn find(db: &Database) -> Result<Vec<PartnerRecord>> {
        let mut conn = db.acquire().await?;
        let partners = sqlx::query_as(&format!("SELECT {} FROM partenaires", COLUMNS))
            .fetch_all(&mut *conn)
            .await?;
        Ok(partners)
    }

    pub async fn find_one(db: &Database, id: &str) -> Result<Option<PartnerRecord>> {
        let mut conn = db.acquire().await?;
        let partner = sqlx::query_as(&format!(
            "SELECT {} FROM partenaires WHERE id = ?",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(partner)
    }

    /// `$set` semantics: only the fields present in `update` are written
    pub async fn update_one(
        db: &Database,
        id: &str,
        update: &PartnerUpdate,
    ) -> Result<UpdateResult> {
        let mut conn = db.acquire().await?;
        let result = sqlx::query(
            r#"
            UPDATE partenaires SET
                name = COALESCE(?, name),
                website = COALESCE(?, website),
                description = COALESCE(?, description),
                logo_file = COALESCE(?, logo_file)
            WHERE id = ?
            "#,
        )
        .bind(&update.name)
        .bind(&update.website)
        .bind(&update.description)
        .bind(&update.logo_file)
        .bind(id)
        .execute(&mut *conn)
        .await?;
        Ok(UpdateResult {
            matched_count: result.rows_affected(),
        })
    }

    pub async fn delete_one(db: &Database, id: &str) -> Result<DeleteResult> {
        let mut conn = db.acquire().await?;
        let result = sqlx::query("DELETE FROM partenaires WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(DeleteResult {
            deleted_count: result.rows_affected(),
        })
    }
}
