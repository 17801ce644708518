pub mod local;

pub use local::*;

use crate::config::StorageConfig;

/// Owns the blob store of each resource
pub struct StorageManager {
    files: BlobStore,
    partners: BlobStore,
}

impl StorageManager {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            files: BlobStore::new(&config.files_dir),
            partners: BlobStore::new(&config.partners_dir),
        }
    }

    /// Store behind the files catalog
    pub fn files(&self) -> &BlobStore {
        &self.files
    }

    /// Store behind partner logos
    pub fn partners(&self) -> &BlobStore {
        &self.partners
    }
}
