//! Synchronization engine for trace warning packages.
//!
//! Decides which hour-bucket packages to fetch from the distribution
//! server, downloads and verifies them, and keeps local package metadata
//! consistent with server staleness and revocations. Unlike a plain
//! mirror, every package is signature-checked before it is persisted.

pub mod config;
pub mod error;
pub mod guard;
pub mod http;
pub mod orchestrator;
pub mod outcome;
pub mod planner;
pub mod readiness;
pub mod reconciler;
pub mod transport;

pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use guard::{RunGuard, RunPermit};
pub use http::HttpTransport;
pub use orchestrator::DownloadOrchestrator;
pub use outcome::{DownloadFailure, DownloadOutcome, FetchStats, SuccessReason};
pub use planner::DeltaPlanner;
pub use readiness::DownloadReadiness;
pub use reconciler::{MetadataReconciler, RevocationSource, StaticRevocations};
pub use transport::{PackageResponse, PackageTransport, TransportError, TransportResult};
