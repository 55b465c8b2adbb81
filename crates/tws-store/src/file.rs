//! File-backed stores.
//!
//! [`FileMetadataStore`] keeps all metadata, windows and run flags in one
//! JSON document that is rewritten atomically (temp file + rename) on every
//! mutation. [`DirPackageStore`] writes one container file per package.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;
use tws_protocol::{PackageCodec, SignedPackage};
use tws_types::{CheckinWindow, PackageId, PackageMetadata, Region};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::traits::{DownloadStatusStore, MetadataPredicate, MetadataStore, PackageStore};

const STATE_FILE: &str = "metadata.json";
const PACKAGE_EXT: &str = "pkg";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct StoreState {
    records: Vec<PackageMetadata>,
    windows: Vec<CheckinWindow>,
    last_run: BTreeMap<Region, bool>,
}

/// Write `data` to `path` via a temp file in the same directory.
fn write_atomic(path: &Path, data: &[u8]) -> StoreResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// Metadata store persisted as a single JSON file.
#[derive(Debug)]
pub struct FileMetadataStore {
    path: PathBuf,
    state: RwLock<StoreState>,
}

impl FileMetadataStore {
    /// Open the store in `dir`, loading existing state if present.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let path = dir.as_ref().join(STATE_FILE);
        let state = if path.exists() {
            let data = fs::read(&path)?;
            serde_json::from_slice(&data).map_err(|e| StoreError::CorruptState {
                path: path.clone(),
                reason: e.to_string(),
            })?
        } else {
            StoreState::default()
        };
        debug!(
            path = %path.display(),
            records = state.records.len(),
            windows = state.windows.len(),
            "metadata store opened"
        );
        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    /// Path of the backing JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `f` to a copy of the state, persist it, then publish it.
    ///
    /// The in-memory state only changes once the file write succeeded.
    fn mutate<T>(&self, f: impl FnOnce(&mut StoreState) -> T) -> StoreResult<T> {
        let mut guard = self.state.write()?;
        let mut next = guard.clone();
        let out = f(&mut next);
        let data =
            serde_json::to_vec_pretty(&next).map_err(|e| StoreError::Serialization(e.to_string()))?;
        write_atomic(&self.path, &data)?;
        *guard = next;
        Ok(out)
    }
}

impl MetadataStore for FileMetadataStore {
    fn insert(&self, record: &PackageMetadata) -> StoreResult<()> {
        self.mutate(|state| {
            state
                .records
                .retain(|r| !(r.id == record.id && r.region == record.region));
            state.records.push(record.clone());
        })
    }

    fn delete_where(&self, predicate: MetadataPredicate<'_>) -> StoreResult<usize> {
        // Skip the rewrite when nothing matches.
        if !self.state.read()?.records.iter().any(|r| predicate(r)) {
            return Ok(0);
        }
        self.mutate(|state| {
            let before = state.records.len();
            state.records.retain(|r| !predicate(r));
            before - state.records.len()
        })
    }

    fn all(&self, region: &Region) -> StoreResult<Vec<PackageMetadata>> {
        let state = self.state.read()?;
        let mut matching: Vec<PackageMetadata> = state
            .records
            .iter()
            .filter(|r| &r.region == region)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.id);
        Ok(matching)
    }

    fn relevant_windows(&self) -> StoreResult<Vec<CheckinWindow>> {
        Ok(self.state.read()?.windows.clone())
    }

    fn insert_window(&self, window: &CheckinWindow) -> StoreResult<()> {
        self.mutate(|state| {
            state.windows.retain(|w| w.id != window.id);
            state.windows.push(window.clone());
        })
    }

    fn remove_window(&self, id: &Uuid) -> StoreResult<bool> {
        if !self.state.read()?.windows.iter().any(|w| &w.id == id) {
            return Ok(false);
        }
        self.mutate(|state| {
            state.windows.retain(|w| &w.id != id);
            true
        })
    }
}

impl DownloadStatusStore for FileMetadataStore {
    fn was_last_run_successful(&self, region: &Region) -> StoreResult<bool> {
        Ok(self
            .state
            .read()?
            .last_run
            .get(region)
            .copied()
            .unwrap_or(false))
    }

    fn set_last_run_successful(&self, region: &Region, successful: bool) -> StoreResult<()> {
        self.mutate(|state| {
            state.last_run.insert(region.clone(), successful);
        })
    }
}

/// Package store writing `<root>/<region>/<id>.pkg` container files.
#[derive(Clone, Debug)]
pub struct DirPackageStore {
    root: PathBuf,
}

impl DirPackageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn package_path(&self, region: &Region, id: PackageId) -> PathBuf {
        self.root
            .join(region.as_str())
            .join(format!("{id}.{PACKAGE_EXT}"))
    }

    /// Read a stored package back, verifying its container checksum.
    pub fn load(&self, region: &Region, id: PackageId) -> StoreResult<Option<SignedPackage>> {
        let path = self.package_path(region, id);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read(&path)?;
        Ok(Some(PackageCodec::decode(&data)?))
    }
}

impl PackageStore for DirPackageStore {
    fn store(&self, region: &Region, id: PackageId, package: &SignedPackage) -> StoreResult<()> {
        let path = self.package_path(region, id);
        let data = PackageCodec::encode(package)?;
        write_atomic(&path, &data)?;
        debug!(path = %path.display(), bytes = data.len(), "package written");
        Ok(())
    }

    fn contains(&self, region: &Region, id: PackageId) -> StoreResult<bool> {
        Ok(self.package_path(region, id).exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn de() -> Region {
        Region::new("DE").unwrap()
    }

    fn record(id: u32, etag: &str) -> PackageMetadata {
        PackageMetadata::new(PackageId::new(id), de(), etag)
    }

    #[test]
    fn state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let window = CheckinWindow::new(
            Utc.timestamp_opt(3600, 0).unwrap(),
            Utc.timestamp_opt(7200, 0).unwrap(),
        )
        .unwrap();
        {
            let store = FileMetadataStore::open(dir.path()).unwrap();
            store.insert(&record(1, "a")).unwrap();
            store.insert(&record(2, "b")).unwrap();
            store.insert_window(&window).unwrap();
            store.set_last_run_successful(&de(), true).unwrap();
        }
        let store = FileMetadataStore::open(dir.path()).unwrap();
        assert_eq!(store.all(&de()).unwrap().len(), 2);
        assert_eq!(store.relevant_windows().unwrap(), vec![window]);
        assert!(store.was_last_run_successful(&de()).unwrap());
    }

    #[test]
    fn insert_replaces_and_delete_where_persists() {
        let dir = TempDir::new().unwrap();
        let store = FileMetadataStore::open(dir.path()).unwrap();
        store.insert(&record(1, "old")).unwrap();
        store.insert(&record(1, "new")).unwrap();
        store.insert(&record(2, "x")).unwrap();
        assert_eq!(store.delete_where(&|r| r.etag == "x").unwrap(), 1);
        assert_eq!(store.delete_where(&|r| r.etag == "missing").unwrap(), 0);

        let reopened = FileMetadataStore::open(dir.path()).unwrap();
        let all = reopened.all(&de()).unwrap();
        assert_eq!(all, vec![record(1, "new")]);
    }

    #[test]
    fn open_without_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileMetadataStore::open(dir.path().join("nested")).unwrap();
        assert!(store.all(&de()).unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn corrupt_state_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(STATE_FILE), b"{not json").unwrap();
        let err = FileMetadataStore::open(dir.path()).unwrap_err();
        assert!(matches!(err, StoreError::CorruptState { .. }));
    }

    #[test]
    fn remove_window_reports_presence() {
        let dir = TempDir::new().unwrap();
        let store = FileMetadataStore::open(dir.path()).unwrap();
        let window = CheckinWindow::new(
            Utc.timestamp_opt(0, 0).unwrap(),
            Utc.timestamp_opt(1, 0).unwrap(),
        )
        .unwrap();
        store.insert_window(&window).unwrap();
        assert!(store.remove_window(&window.id).unwrap());
        assert!(!store.remove_window(&window.id).unwrap());
    }

    #[test]
    fn dir_package_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = DirPackageStore::new(dir.path());
        let pkg = SignedPackage::new(b"payload".to_vec(), vec![2; 64]);
        let id = PackageId::new(449_005);

        assert!(!store.contains(&de(), id).unwrap());
        store.store(&de(), id, &pkg).unwrap();
        assert!(store.contains(&de(), id).unwrap());
        assert!(store.package_path(&de(), id).ends_with("DE/449005.pkg"));
        assert_eq!(store.load(&de(), id).unwrap(), Some(pkg));
        assert_eq!(store.load(&de(), PackageId::new(1)).unwrap(), None);
    }

    #[test]
    fn dir_package_store_detects_corruption() {
        let dir = TempDir::new().unwrap();
        let store = DirPackageStore::new(dir.path());
        let id = PackageId::new(7);
        store
            .store(&de(), id, &SignedPackage::new(b"payload".to_vec(), vec![2; 64]))
            .unwrap();
        let path = store.package_path(&de(), id);
        let mut data = fs::read(&path).unwrap();
        data[8] ^= 0xFF;
        fs::write(&path, data).unwrap();
        assert!(matches!(store.load(&de(), id), Err(StoreError::Codec(_))));
    }
}
