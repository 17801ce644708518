//! Metadata store: one collection per resource, document-style operations.
//!
//! No schema validation happens here; callers check required fields first.

pub mod files;
pub mod partners;

pub use files::FileCollection;
pub use partners::PartnerCollection;

/// Outcome of `update_one`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateResult {
    pub matched_count: u64,
}

/// Outcome of `delete_one`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteResult {
    pub deleted_count: u64,
}
