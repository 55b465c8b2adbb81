use tws_protocol::SignedPackage;
use tws_types::{CheckinWindow, PackageId, PackageMetadata, Region};
use uuid::Uuid;

use crate::error::StoreResult;

/// Predicate over metadata records, used for bulk deletion.
pub type MetadataPredicate<'a> = &'a dyn Fn(&PackageMetadata) -> bool;

/// Durable store of package metadata records and check-in windows.
///
/// All implementations must satisfy these invariants:
/// - Records are unique by `(id, region)`; inserting an existing key
///   replaces the record.
/// - Reads always reflect the store's current contents. Callers must not
///   assume they are the only writer.
/// - All I/O errors are propagated, never silently ignored.
pub trait MetadataStore: Send + Sync {
    /// Insert a record, replacing any record with the same `(id, region)`.
    fn insert(&self, record: &PackageMetadata) -> StoreResult<()>;

    /// Delete every record matching `predicate`. Returns the number removed.
    ///
    /// Deleting nothing is not an error.
    fn delete_where(&self, predicate: MetadataPredicate<'_>) -> StoreResult<usize>;

    /// All records for `region`, ascending by id.
    fn all(&self, region: &Region) -> StoreResult<Vec<PackageMetadata>>;

    /// All locally relevant time windows.
    fn relevant_windows(&self) -> StoreResult<Vec<CheckinWindow>>;

    /// Add a relevant time window.
    fn insert_window(&self, window: &CheckinWindow) -> StoreResult<()>;

    /// Remove a relevant time window. Returns `true` if it existed.
    fn remove_window(&self, id: &Uuid) -> StoreResult<bool>;

    /// Whether a record exists for `(id, region)`.
    fn contains(&self, region: &Region, id: PackageId) -> StoreResult<bool> {
        Ok(self.all(region)?.iter().any(|r| r.id == id))
    }
}

/// Durable per-region "last run succeeded" flag.
///
/// Written by the caller after observing a run outcome, never by the
/// download engine itself.
pub trait DownloadStatusStore: Send + Sync {
    /// Unknown regions read as `false`.
    fn was_last_run_successful(&self, region: &Region) -> StoreResult<bool>;

    fn set_last_run_successful(&self, region: &Region, successful: bool) -> StoreResult<()>;
}

/// Destination for verified package bytes.
pub trait PackageStore: Send + Sync {
    /// Persist a verified package, replacing any previous copy.
    fn store(&self, region: &Region, id: PackageId, package: &SignedPackage) -> StoreResult<()>;

    /// Whether a package is held for `(id, region)`.
    fn contains(&self, region: &Region, id: PackageId) -> StoreResult<bool>;
}
