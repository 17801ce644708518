use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// File catalog record, one per uploaded blob
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub file_name: String,
    pub file_path: String,
    pub upload_date: String,
}

/// Fields needed to insert a new file record
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub file_name: String,
    pub file_path: String,
}

/// Query string carried by PUT and DELETE
#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}
