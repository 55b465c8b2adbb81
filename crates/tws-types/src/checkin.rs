use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;
use crate::package::PackageId;

/// A locally relevant time window, e.g. a recorded presence at a venue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinWindow {
    pub id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CheckinWindow {
    /// Create a window with a fresh time-ordered id.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TypeError> {
        if end < start {
            return Err(TypeError::InvertedWindow);
        }
        Ok(Self {
            id: Uuid::now_v7(),
            start,
            end,
        })
    }

    /// Bucket containing the window's start instant.
    pub fn start_package(&self) -> PackageId {
        PackageId::from_datetime(&self.start)
    }
}

/// Minimum bucketed start instant across all windows.
///
/// `None` when there are no windows.
pub fn earliest_relevant_package(windows: &[CheckinWindow]) -> Option<PackageId> {
    windows.iter().map(CheckinWindow::start_package).min()
}
