use std::collections::HashMap;
use std::sync::RwLock;

use tws_protocol::SignedPackage;
use tws_types::{CheckinWindow, PackageId, PackageMetadata, Region};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::traits::{DownloadStatusStore, MetadataPredicate, MetadataStore, PackageStore};

/// In-memory, HashMap-based metadata store.
///
/// Intended for tests and embedding. State lives behind `RwLock`s and is
/// lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    records: RwLock<HashMap<(Region, PackageId), PackageMetadata>>,
    windows: RwLock<Vec<CheckinWindow>>,
    last_run: RwLock<HashMap<Region, bool>>,
}

impl InMemoryMetadataStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records across all regions.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.records.read()?.len())
    }

    /// Returns `true` if no records are held.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn insert(&self, record: &PackageMetadata) -> StoreResult<()> {
        self.records.write()?.insert(record.key(), record.clone());
        Ok(())
    }

    fn delete_where(&self, predicate: MetadataPredicate<'_>) -> StoreResult<usize> {
        let mut records = self.records.write()?;
        let before = records.len();
        records.retain(|_, record| !predicate(record));
        Ok(before - records.len())
    }

    fn all(&self, region: &Region) -> StoreResult<Vec<PackageMetadata>> {
        let records = self.records.read()?;
        let mut matching: Vec<PackageMetadata> = records
            .values()
            .filter(|r| &r.region == region)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.id);
        Ok(matching)
    }

    fn relevant_windows(&self) -> StoreResult<Vec<CheckinWindow>> {
        Ok(self.windows.read()?.clone())
    }

    fn insert_window(&self, window: &CheckinWindow) -> StoreResult<()> {
        let mut windows = self.windows.write()?;
        windows.retain(|w| w.id != window.id);
        windows.push(window.clone());
        Ok(())
    }

    fn remove_window(&self, id: &Uuid) -> StoreResult<bool> {
        let mut windows = self.windows.write()?;
        let before = windows.len();
        windows.retain(|w| &w.id != id);
        Ok(windows.len() != before)
    }

    fn contains(&self, region: &Region, id: PackageId) -> StoreResult<bool> {
        Ok(self.records.read()?.contains_key(&(region.clone(), id)))
    }
}

impl DownloadStatusStore for InMemoryMetadataStore {
    fn was_last_run_successful(&self, region: &Region) -> StoreResult<bool> {
        Ok(self.last_run.read()?.get(region).copied().unwrap_or(false))
    }

    fn set_last_run_successful(&self, region: &Region, successful: bool) -> StoreResult<()> {
        self.last_run.write()?.insert(region.clone(), successful);
        Ok(())
    }
}

/// In-memory package store.
#[derive(Debug, Default)]
pub struct InMemoryPackageStore {
    packages: RwLock<HashMap<(Region, PackageId), SignedPackage>>,
}

impl InMemoryPackageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of packages held.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.packages.read()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, region: &Region, id: PackageId) -> StoreResult<Option<SignedPackage>> {
        Ok(self.packages.read()?.get(&(region.clone(), id)).cloned())
    }
}

impl PackageStore for InMemoryPackageStore {
    fn store(&self, region: &Region, id: PackageId, package: &SignedPackage) -> StoreResult<()> {
        self.packages
            .write()?
            .insert((region.clone(), id), package.clone());
        Ok(())
    }

    fn contains(&self, region: &Region, id: PackageId) -> StoreResult<bool> {
        Ok(self.packages.read()?.contains_key(&(region.clone(), id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn de() -> Region {
        Region::new("DE").unwrap()
    }

    fn nl() -> Region {
        Region::new("NL").unwrap()
    }

    fn record(id: u32, region: Region, etag: &str) -> PackageMetadata {
        PackageMetadata::new(PackageId::new(id), region, etag)
    }

    #[test]
    fn insert_and_list_by_region() {
        let store = InMemoryMetadataStore::new();
        store.insert(&record(3, de(), "c")).unwrap();
        store.insert(&record(1, de(), "a")).unwrap();
        store.insert(&record(2, nl(), "b")).unwrap();

        let ids: Vec<u32> = store.all(&de()).unwrap().iter().map(|r| r.id.value()).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(store.all(&nl()).unwrap().len(), 1);
        assert_eq!(store.len().unwrap(), 3);
    }

    #[test]
    fn insert_replaces_same_key() {
        let store = InMemoryMetadataStore::new();
        store.insert(&record(1, de(), "old")).unwrap();
        store.insert(&record(1, de(), "new")).unwrap();
        let all = store.all(&de()).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].etag, "new");
    }

    #[test]
    fn same_id_in_different_regions_is_distinct() {
        let store = InMemoryMetadataStore::new();
        store.insert(&record(1, de(), "x")).unwrap();
        store.insert(&record(1, nl(), "x")).unwrap();
        assert_eq!(store.len().unwrap(), 2);
        assert!(store.contains(&de(), PackageId::new(1)).unwrap());
        assert!(!store.contains(&de(), PackageId::new(2)).unwrap());
    }

    #[test]
    fn delete_where_counts_removed() {
        let store = InMemoryMetadataStore::new();
        for id in 1..=5 {
            store.insert(&record(id, de(), "e")).unwrap();
        }
        let removed = store.delete_where(&|r| r.id.value() < 3).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.delete_where(&|_| false).unwrap(), 0);
        assert_eq!(store.len().unwrap(), 3);
    }

    #[test]
    fn windows_insert_and_remove() {
        let store = InMemoryMetadataStore::new();
        let w = CheckinWindow::new(
            Utc.timestamp_opt(0, 0).unwrap(),
            Utc.timestamp_opt(60, 0).unwrap(),
        )
        .unwrap();
        store.insert_window(&w).unwrap();
        store.insert_window(&w).unwrap();
        assert_eq!(store.relevant_windows().unwrap().len(), 1);
        assert!(store.remove_window(&w.id).unwrap());
        assert!(!store.remove_window(&w.id).unwrap());
        assert!(store.relevant_windows().unwrap().is_empty());
    }

    #[test]
    fn status_defaults_to_unsuccessful() {
        let store = InMemoryMetadataStore::new();
        assert!(!store.was_last_run_successful(&de()).unwrap());
        store.set_last_run_successful(&de(), true).unwrap();
        assert!(store.was_last_run_successful(&de()).unwrap());
        assert!(!store.was_last_run_successful(&nl()).unwrap());
    }

    #[test]
    fn package_store_roundtrip() {
        let store = InMemoryPackageStore::new();
        let pkg = SignedPackage::new(b"bin".to_vec(), vec![1; 64]);
        store.store(&de(), PackageId::new(9), &pkg).unwrap();
        assert!(store.contains(&de(), PackageId::new(9)).unwrap());
        assert!(!store.contains(&nl(), PackageId::new(9)).unwrap());
        assert_eq!(store.get(&de(), PackageId::new(9)).unwrap(), Some(pkg));
    }
}
