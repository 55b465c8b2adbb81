use serde::{Deserialize, Serialize};

use crate::package::PackageId;
use crate::region::Region;

/// Record of one downloaded, verified and persisted package.
///
/// Unique by `(id, region)`. Records are never mutated; a re-fetch
/// replaces the record as a whole.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub id: PackageId,
    pub region: Region,
    pub etag: String,
}

impl PackageMetadata {
    pub fn new(id: PackageId, region: Region, etag: impl Into<String>) -> Self {
        Self {
            id,
            region,
            etag: etag.into(),
        }
    }

    /// Store key for this record.
    pub fn key(&self) -> (Region, PackageId) {
        (self.region.clone(), self.id)
    }
}

/// Server-issued marker revoking a package by its ETag.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevocationEntry {
    pub etag: String,
}

impl RevocationEntry {
    pub fn new(etag: impl Into<String>) -> Self {
        Self { etag: etag.into() }
    }

    /// Exact string match against a metadata record's ETag.
    pub fn matches(&self, record: &PackageMetadata) -> bool {
        self.etag == record.etag
    }
}
