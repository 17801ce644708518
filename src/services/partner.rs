use crate::collections::PartnerCollection;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::ingest::Ingested;
use crate::models::{NewPartnerRecord, PartnerRecord, PartnerUpdate};
use crate::storage::BlobStore;

const NAME_FIELDS: &[&str] = &["name", "nom"];
const WEBSITE_FIELDS: &[&str] = &["website", "lien"];
const DESCRIPTION_FIELDS: &[&str] = &["description"];
const LOGO_PARTS: &[&str] = &["logo", "logoFile", "fileupload"];

/// Partner directory service
pub struct PartnerService;

impl PartnerService {
    pub async fn list_partners(db: &Database) -> Result<Vec<PartnerRecord>> {
        PartnerCollection::find(db).await
    }

    /// Create a partner; the optional logo has already been written to `store`.
    pub async fn create_partner(
        db: &Database,
        store: &BlobStore,
        ingested: Ingested,
    ) -> Result<PartnerRecord> {
        match Self::commit_partner(db, &ingested).await {
            Ok(partner) => {
                tracing::info!("Partner {} ({}) created", partner.id, partner.name);
                Ok(partner)
            }
            Err(e) => {
                ingested.discard(store).await;
                Err(e)
            }
        }
    }

    async fn commit_partner(db: &Database, ingested: &Ingested) -> Result<PartnerRecord> {
        let name = ingested
            .field(NAME_FIELDS)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Validation("Missing partner name".to_string()))?;

        let logo_file = Self::logo_name(ingested)?;

        PartnerCollection::insert_one(
            db,
            NewPartnerRecord {
                name: name.to_string(),
                website: ingested.field(WEBSITE_FIELDS).unwrap_or_default().to_string(),
                description: ingested
                    .field(DESCRIPTION_FIELDS)
                    .unwrap_or_default()
                    .to_string(),
                logo_file,
            },
        )
        .await
    }

    fn logo_name(ingested: &Ingested) -> Result<Option<String>> {
        match ingested.file(LOGO_PARTS)? {
            Some(logo) => logo
                .resolved_name()
                .map(|name| Some(name.to_string()))
                .ok_or_else(|| AppError::Validation("Invalid logo file".to_string())),
            None => Ok(None),
        }
    }

    /// Update descriptive fields and optionally replace the logo.
    pub async fn update_partner(
        db: &Database,
        store: &BlobStore,
        id: Option<String>,
        ingested: Ingested,
    ) -> Result<()> {
        let outcome = Self::apply_update(db, store, id, &ingested).await;
        if outcome.is_err() {
            ingested.discard(store).await;
        }
        outcome
    }

    async fn apply_update(
        db: &Database,
        store: &BlobStore,
        id: Option<String>,
        ingested: &Ingested,
    ) -> Result<()> {
        let id = id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Validation("Missing partner id".to_string()))?;

        let update = PartnerUpdate {
            name: ingested.field(NAME_FIELDS).map(|s| s.trim().to_string()),
            website: ingested.field(WEBSITE_FIELDS).map(|s| s.to_string()),
            description: ingested.field(DESCRIPTION_FIELDS).map(|s| s.to_string()),
            logo_file: Self::logo_name(ingested)?,
        };
        if update.is_empty() {
            return Err(AppError::Validation("Nothing to update".to_string()));
        }
        if update.name.as_deref() == Some("") {
            return Err(AppError::Validation(
                "Partner name cannot be empty".to_string(),
            ));
        }

        // The replaced logo is only known before the update
        let previous_logo = match update.logo_file {
            Some(_) => PartnerCollection::find_one(db, &id)
                .await?
                .and_then(|p| p.logo_file),
            None => None,
        };

        let result = PartnerCollection::update_one(db, &id, &update).await?;
        if result.matched_count == 0 {
            return Err(AppError::NotFound("Partner not found".to_string()));
        }
        tracing::info!("Partner {} updated", id);

        if let (Some(old), Some(new)) = (previous_logo, update.logo_file.as_deref()) {
            if old != new {
                if let Err(e) = store.remove(&store.path_of(&old)).await {
                    tracing::warn!("Partner {}: failed to remove replaced logo: {}", id, e);
                }
            }
        }

        Ok(())
    }

    /// Remove the logo blob (if any), then the record. A failed blob removal keeps
    /// the record in place.
    pub async fn delete_partner(
        db: &Database,
        store: &BlobStore,
        id: Option<String>,
    ) -> Result<()> {
        let id = id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Validation("Missing partner id".to_string()))?;

        let partner = PartnerCollection::find_one(db, &id)
            .await?
            .ok_or_else(|| AppError::NotFound("Partner not found".to_string()))?;

        if let Some(logo) = &partner.logo_file {
            store.remove(&store.path_of(logo)).await?;
        }

        let result = PartnerCollection::delete_one(db, &id).await?;
        if result.deleted_count == 0 {
            return Err(AppError::NotFound("Partner not found".to_string()));
        }

        tracing::info!("Partner {} deleted", id);
        Ok(())
    }
}
