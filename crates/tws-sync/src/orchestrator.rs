//! The download orchestrator.
//!
//! One run goes `discovering → planning → fetching(1..n) → reconciling`,
//! returning exactly one [`DownloadOutcome`]. Runs are serialized by a
//! shared [`RunGuard`]; a concurrent call fails fast instead of queueing.
//!
//! Fetches are processed strictly in ascending id order and each package
//! is persisted before the next is requested, so an abort leaves every
//! earlier package of the same run committed.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use tws_crypto::PackageVerifier;
use tws_store::{MetadataStore, PackageStore};
use tws_types::{earliest_relevant_package, AvailableRange, PackageId, PackageMetadata, Region};

use crate::guard::RunGuard;
use crate::outcome::{DownloadFailure, DownloadOutcome, FetchStats, SuccessReason};
use crate::planner::DeltaPlanner;
use crate::reconciler::{MetadataReconciler, RevocationSource, StaticRevocations};
use crate::transport::PackageTransport;

enum Fetched {
    Package,
    Empty,
}

/// Drives discovery, planning, verified download and reconciliation.
pub struct DownloadOrchestrator {
    transport: Arc<dyn PackageTransport>,
    metadata: Arc<dyn MetadataStore>,
    packages: Arc<dyn PackageStore>,
    verifier: Arc<dyn PackageVerifier>,
    revocations: Arc<dyn RevocationSource>,
    guard: Arc<RunGuard>,
}

impl DownloadOrchestrator {
    pub fn new(
        transport: Arc<dyn PackageTransport>,
        metadata: Arc<dyn MetadataStore>,
        packages: Arc<dyn PackageStore>,
        verifier: Arc<dyn PackageVerifier>,
    ) -> Self {
        Self {
            transport,
            metadata,
            packages,
            verifier,
            revocations: Arc::new(StaticRevocations::default()),
            guard: Arc::new(RunGuard::new()),
        }
    }

    /// Use `revocations` during reconciliation.
    pub fn with_revocations(mut self, revocations: Arc<dyn RevocationSource>) -> Self {
        self.revocations = revocations;
        self
    }

    /// Share a single-flight guard with other orchestrators.
    pub fn with_guard(mut self, guard: Arc<RunGuard>) -> Self {
        self.guard = guard;
        self
    }

    pub fn guard(&self) -> &Arc<RunGuard> {
        &self.guard
    }

    /// Run one download for `region`.
    ///
    /// The run executes on its own task: dropping the returned future does
    /// not cancel it, and the guard is released when the run ends.
    pub async fn start_download(self: &Arc<Self>, region: &Region) -> DownloadOutcome {
        let Some(permit) = self.guard.try_permit() else {
            warn!(region = %region, "download already running; rejecting");
            return DownloadFailure::DownloadIsRunning.into();
        };

        let this = Arc::clone(self);
        let region = region.clone();
        let handle = tokio::spawn(async move {
            let _permit = permit;
            this.run(&region).await
        });

        match handle.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                error!(error = %e, "download task was cancelled");
                DownloadFailure::General.into()
            }
        }
    }

    /// Run downloads for each region in turn.
    pub async fn run_all(self: &Arc<Self>, regions: &[Region]) -> Vec<(Region, DownloadOutcome)> {
        let mut outcomes = Vec::with_capacity(regions.len());
        for region in regions {
            let outcome = self.start_download(region).await;
            outcomes.push((region.clone(), outcome));
        }
        outcomes
    }

    async fn run(&self, region: &Region) -> DownloadOutcome {
        info!(region = %region, "trace warning package download started");
        let outcome = self.run_inner(region).await;
        match outcome {
            DownloadOutcome::Success(reason) => {
                info!(region = %region, outcome = reason.code(), "download finished")
            }
            DownloadOutcome::Failure(failure) => {
                warn!(region = %region, outcome = failure.code(), "download failed: {failure}")
            }
        }
        outcome
    }

    async fn run_inner(&self, region: &Region) -> DownloadOutcome {
        match self.metadata.relevant_windows() {
            Ok(windows) if windows.is_empty() => return SuccessReason::NoCheckins.into(),
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "cannot read check-in windows");
                return DownloadFailure::Storage.into();
            }
        }

        let range = match self.transport.discover(region).await {
            Ok(range) => range,
            Err(e) => {
                warn!(region = %region, error = %e, "package discovery failed");
                return DownloadFailure::General.into();
            }
        };
        debug!(
            region = %region,
            oldest = %range.oldest,
            latest = %range.latest,
            "discovered packages"
        );

        // Windows are read again: they may have been deleted while discovery ran.
        let earliest = match self.metadata.relevant_windows() {
            Ok(windows) => earliest_relevant_package(&windows),
            Err(e) => {
                warn!(error = %e, "cannot read check-in windows");
                return DownloadFailure::Storage.into();
            }
        };
        let Some(earliest) = earliest else {
            return DownloadFailure::NoEarliestRelevantPackage.into();
        };

        if range.is_empty() {
            return SuccessReason::EmptyAvailablePackages.into();
        }

        let missing = match self.missing_packages(region, &range, earliest) {
            Ok(missing) => missing,
            Err(failure) => return failure.into(),
        };
        if missing.is_empty() {
            return SuccessReason::NoPackagesAvailable.into();
        }
        debug!(region = %region, count = missing.len(), %earliest, "planned package downloads");

        let mut stats = FetchStats::default();
        for id in missing {
            match self.fetch_one(region, id).await {
                Ok(Fetched::Package) => stats.packages += 1,
                Ok(Fetched::Empty) => stats.empty += 1,
                Err(failure) => return failure.into(),
            }
        }

        self.reconcile(region, range.oldest, earliest);
        stats.outcome()
    }

    fn missing_packages(
        &self,
        region: &Region,
        range: &AvailableRange,
        earliest: PackageId,
    ) -> Result<Vec<PackageId>, DownloadFailure> {
        let cached: HashSet<PackageId> = self
            .metadata
            .all(region)
            .map_err(|e| {
                warn!(region = %region, error = %e, "cannot read package metadata");
                DownloadFailure::Storage
            })?
            .into_iter()
            .map(|record| record.id)
            .collect();
        Ok(DeltaPlanner::plan_range(range, earliest, &cached))
    }

    async fn fetch_one(&self, region: &Region, id: PackageId) -> Result<Fetched, DownloadFailure> {
        let response = self.transport.fetch_package(region, id).await.map_err(|e| {
            warn!(region = %region, %id, error = %e, "package download failed");
            DownloadFailure::InvalidResponse
        })?;

        let Some(etag) = response.etag.filter(|etag| !etag.is_empty()) else {
            warn!(region = %region, %id, "package has no ETag");
            return Err(DownloadFailure::Identification);
        };

        let fetched = match response.package {
            None => {
                debug!(region = %region, %id, %etag, "empty package");
                Fetched::Empty
            }
            Some(package) => {
                if !self.verifier.verify(&package.bin, &package.signature) {
                    warn!(region = %region, %id, %etag, "package signature invalid");
                    return Err(DownloadFailure::Verification);
                }
                self.packages.store(region, id, &package).map_err(|e| {
                    warn!(region = %region, %id, error = %e, "cannot store package");
                    DownloadFailure::Storage
                })?;
                debug!(region = %region, %id, %etag, bytes = package.bin.len(), "package stored");
                Fetched::Package
            }
        };

        self.metadata
            .insert(&PackageMetadata::new(id, region.clone(), etag))
            .map_err(|e| {
                warn!(region = %region, %id, error = %e, "cannot record package metadata");
                DownloadFailure::Storage
            })?;
        Ok(fetched)
    }

    /// Evict stale, then revoked, metadata. Failures are logged only.
    fn reconcile(&self, region: &Region, oldest: PackageId, earliest: PackageId) {
        let reconciler = MetadataReconciler::new(Arc::clone(&self.metadata));
        if let Err(e) = reconciler.evict_stale(region, oldest, earliest) {
            warn!(region = %region, error = %e, "stale metadata eviction failed");
        }
        let revocations = self.revocations.revocations();
        if let Err(e) = reconciler.evict_revoked(&revocations) {
            warn!(region = %region, error = %e, "revoked metadata eviction failed");
        }
    }
}
