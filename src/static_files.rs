use tower_http::services::ServeDir;

use crate::storage::BlobStore;

/// Read-only view of one upload directory
pub fn blob_service(store: &BlobStore) -> ServeDir {
    ServeDir::new(store.root()).append_index_html_on_directories(false)
}
