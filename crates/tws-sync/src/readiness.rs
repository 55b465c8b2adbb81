use std::sync::Arc;

use tracing::warn;
use tws_store::{DownloadStatusStore, MetadataStore};
use tws_types::{PackageId, Region};

/// Decides whether a scheduler should start a download run at all.
#[derive(Clone)]
pub struct DownloadReadiness {
    metadata: Arc<dyn MetadataStore>,
    status: Arc<dyn DownloadStatusStore>,
}

impl DownloadReadiness {
    pub fn new(metadata: Arc<dyn MetadataStore>, status: Arc<dyn DownloadStatusStore>) -> Self {
        Self { metadata, status }
    }

    /// Readiness for the current hour bucket.
    pub fn should_start_download(&self, region: &Region) -> bool {
        self.should_start_download_at(region, PackageId::now())
    }

    /// Only "last run succeeded and the current bucket is already cached"
    /// suppresses a run. Store read failures favour running.
    pub fn should_start_download_at(&self, region: &Region, current: PackageId) -> bool {
        match self.status.was_last_run_successful(region) {
            Ok(true) => {}
            Ok(false) => return true,
            Err(e) => {
                warn!(region = %region, error = %e, "cannot read last run status");
                return true;
            }
        }
        match self.metadata.contains(region, current) {
            Ok(already_downloaded) => !already_downloaded,
            Err(e) => {
                warn!(region = %region, error = %e, "cannot read package metadata");
                true
            }
        }
    }
}
