use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Width of one package bucket in seconds.
pub const BUCKET_SECS: i64 = 3600;

/// Hour bucket index: whole hours elapsed since the Unix epoch.
///
/// The server publishes at most one package per region and bucket, so the
/// id is both the remote catalog index and the local metadata key.
/// Instants before the epoch clamp to bucket zero.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(u32);

impl PackageId {
    pub const fn new(hours: u32) -> Self {
        Self(hours)
    }

    /// Bucket containing the given Unix timestamp (seconds).
    pub fn from_unix_secs(secs: i64) -> Self {
        let hours = secs.max(0) / BUCKET_SECS;
        Self(u32::try_from(hours).unwrap_or(u32::MAX))
    }

    /// Bucket containing the given instant.
    pub fn from_datetime(at: &DateTime<Utc>) -> Self {
        Self::from_unix_secs(at.timestamp())
    }

    /// Bucket containing the current wall-clock time.
    pub fn now() -> Self {
        Self::from_datetime(&Utc::now())
    }

    /// The raw hour count.
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// First instant covered by this bucket.
    pub fn start(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(i64::from(self.0) * BUCKET_SECS, 0)
            .single()
            .unwrap_or_default()
    }

    /// The following bucket, saturating at the maximum id.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Inclusive ascending sequence `from..=to`; empty when `from > to`.
    pub fn range(from: PackageId, to: PackageId) -> impl Iterator<Item = PackageId> {
        (from.0..=to.0).map(PackageId)
    }
}

impl fmt::Debug for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackageId({})", self.0)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PackageId {
    fn from(hours: u32) -> Self {
        Self(hours)
    }
}

impl FromStr for PackageId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|e| TypeError::InvalidPackageId(format!("{s:?}: {e}")))
    }
}

/// Package ids the server advertises for a region.
///
/// `oldest > latest` is a valid state meaning the catalog is currently
/// empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableRange {
    pub oldest: PackageId,
    pub latest: PackageId,
}

impl AvailableRange {
    pub fn new(oldest: impl Into<PackageId>, latest: impl Into<PackageId>) -> Self {
        Self {
            oldest: oldest.into(),
            latest: latest.into(),
        }
    }

    /// Returns `true` if the server has no packages published.
    pub fn is_empty(&self) -> bool {
        self.oldest > self.latest
    }

    /// All advertised ids at or after `earliest`, ascending.
    pub fn ids_from(&self, earliest: PackageId) -> impl Iterator<Item = PackageId> {
        PackageId::range(self.oldest.max(earliest), self.latest)
    }
}
