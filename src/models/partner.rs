use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Partner directory record
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PartnerRecord {
    pub id: String,
    pub name: String,
    pub website: String,
    pub description: String,
    /// Stored name of the logo blob inside the partners upload directory
    pub logo_file: Option<String>,
    pub upload_date: String,
}

/// Fields needed to insert a new partner record
#[derive(Debug, Clone)]
pub struct NewPartnerRecord {
    pub name: String,
    pub website: String,
    pub description: String,
    pub logo_file: Option<String>,
}

/// Partial update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default)]
pub struct PartnerUpdate {
    pub name: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub logo_file: Option<String>,
}

impl PartnerUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.website.is_none()
            && self.description.is_none()
            && self.logo_file.is_none()
    }
}
