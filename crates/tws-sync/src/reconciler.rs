use std::sync::Arc;

use tracing::debug;
use tws_store::{MetadataStore, StoreResult};
use tws_types::{PackageId, Region, RevocationEntry};

/// Supplies the server's current ETag revocation list.
pub trait RevocationSource: Send + Sync {
    fn revocations(&self) -> Vec<RevocationEntry>;
}

/// A fixed revocation list, e.g. from configuration.
#[derive(Clone, Debug, Default)]
pub struct StaticRevocations {
    entries: Vec<RevocationEntry>,
}

impl StaticRevocations {
    pub fn new(entries: Vec<RevocationEntry>) -> Self {
        Self { entries }
    }

    pub fn from_etags<S: AsRef<str>>(etags: &[S]) -> Self {
        Self::new(etags.iter().map(|e| RevocationEntry::new(e.as_ref())).collect())
    }
}

impl RevocationSource for StaticRevocations {
    fn revocations(&self) -> Vec<RevocationEntry> {
        self.entries.clone()
    }
}

/// Evicts stale and revoked package metadata.
///
/// Both operations filter the store's current contents and are idempotent.
#[derive(Clone)]
pub struct MetadataReconciler {
    store: Arc<dyn MetadataStore>,
}

impl MetadataReconciler {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// Delete `region` records with `id < max(oldest, earliest)`.
    ///
    /// Below `oldest` a record can no longer be checked against the server;
    /// below `earliest` it is irrelevant to the caller.
    pub fn evict_stale(
        &self,
        region: &Region,
        oldest: PackageId,
        earliest: PackageId,
    ) -> StoreResult<usize> {
        let horizon = oldest.max(earliest);
        let removed = self
            .store
            .delete_where(&|record| &record.region == region && record.id < horizon)?;
        debug!(region = %region, %horizon, removed, "evicted stale package metadata");
        Ok(removed)
    }

    /// Delete every record whose ETag matches a revocation entry.
    ///
    /// Entries matching nothing are ignored.
    pub fn evict_revoked(&self, entries: &[RevocationEntry]) -> StoreResult<usize> {
        if entries.is_empty() {
            return Ok(0);
        }
        let removed = self
            .store
            .delete_where(&|record| entries.iter().any(|entry| entry.matches(record)))?;
        debug!(entries = entries.len(), removed, "evicted revoked package metadata");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tws_store::InMemoryMetadataStore;
    use tws_types::PackageMetadata;

    fn de() -> Region {
        Region::new("DE").unwrap()
    }

    fn seeded(ids: &[u32]) -> (Arc<InMemoryMetadataStore>, MetadataReconciler) {
        let store = Arc::new(InMemoryMetadataStore::new());
        for id in ids {
            store
                .insert(&PackageMetadata::new(PackageId::new(*id), de(), format!("etag-{id}")))
                .unwrap();
        }
        let reconciler = MetadataReconciler::new(store.clone());
        (store, reconciler)
    }

    fn remaining(store: &InMemoryMetadataStore) -> Vec<u32> {
        store.all(&de()).unwrap().iter().map(|r| r.id.value()).collect()
    }

    #[test]
    fn evict_stale_uses_larger_horizon() {
        let (store, reconciler) = seeded(&[100, 101, 102, 103, 104]);
        let removed = reconciler
            .evict_stale(&de(), PackageId::new(100), PackageId::new(103))
            .unwrap();
        assert_eq!(removed, 3);
        assert_eq!(remaining(&store), vec![103, 104]);
    }

    #[test]
    fn evict_stale_oldest_dominates() {
        let (store, reconciler) = seeded(&[100, 101, 102, 103, 104]);
        reconciler
            .evict_stale(&de(), PackageId::new(102), PackageId::new(50))
            .unwrap();
        assert_eq!(remaining(&store), vec![102, 103, 104]);
    }

    #[test]
    fn evict_stale_is_idempotent_and_region_scoped() {
        let (store, reconciler) = seeded(&[1, 2, 3]);
        let nl = Region::new("NL").unwrap();
        store
            .insert(&PackageMetadata::new(PackageId::new(1), nl.clone(), "nl"))
            .unwrap();
        assert_eq!(reconciler.evict_stale(&de(), PackageId::new(3), PackageId::new(0)).unwrap(), 2);
        assert_eq!(reconciler.evict_stale(&de(), PackageId::new(3), PackageId::new(0)).unwrap(), 0);
        assert_eq!(store.all(&nl).unwrap().len(), 1);
    }

    #[test]
    fn evict_revoked_matches_exact_etags() {
        let (store, reconciler) = seeded(&[1, 2, 3]);
        let removed = reconciler
            .evict_revoked(&[
                RevocationEntry::new("etag-2"),
                RevocationEntry::new("never-downloaded"),
                RevocationEntry::new("ETAG-3"),
            ])
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(remaining(&store), vec![1, 3]);
    }

    #[test]
    fn evict_revoked_with_no_entries_is_noop() {
        let (store, reconciler) = seeded(&[1]);
        assert_eq!(reconciler.evict_revoked(&[]).unwrap(), 0);
        assert_eq!(remaining(&store), vec![1]);
    }

    #[test]
    fn static_revocations_from_etags() {
        let source = StaticRevocations::from_etags(&["a", "b"]);
        assert_eq!(
            source.revocations(),
            vec![RevocationEntry::new("a"), RevocationEntry::new("b")]
        );
    }

    proptest! {
        #[test]
        fn evict_stale_respects_horizon(
            ids in proptest::collection::btree_set(0u32..200, 0..50),
            oldest in 0u32..200,
            earliest in 0u32..200,
        ) {
            let ids: Vec<u32> = ids.into_iter().collect();
            let (store, reconciler) = seeded(&ids);
            reconciler
                .evict_stale(&de(), PackageId::new(oldest), PackageId::new(earliest))
                .unwrap();
            let horizon = oldest.max(earliest);
            let expected: Vec<u32> = ids.iter().copied().filter(|id| *id >= horizon).collect();
            prop_assert_eq!(remaining(&store), expected);
        }

        #[test]
        fn evict_revoked_leaves_only_unrevoked(
            ids in proptest::collection::btree_set(0u32..100, 0..40),
            revoked in proptest::collection::btree_set(0u32..100, 0..40),
        ) {
            let ids: Vec<u32> = ids.into_iter().collect();
            let (store, reconciler) = seeded(&ids);
            let entries: Vec<RevocationEntry> = revoked
                .iter()
                .map(|id| RevocationEntry::new(format!("etag-{id}")))
                .collect();
            reconciler.evict_revoked(&entries).unwrap();
            let expected: Vec<u32> =
                ids.iter().copied().filter(|id| !revoked.contains(id)).collect();
            prop_assert_eq!(remaining(&store), expected);
        }
    }
}
