//! Foundation types for trace warning sync (TWS).
//!
//! Identifiers and records shared by every other TWS crate.
//!
//! # Key Types
//!
//! - [`PackageId`] -- Hour bucket index, the catalog's primary ordering key
//! - [`AvailableRange`] -- Oldest/latest package ids advertised by the server
//! - [`Region`] -- Validated region (country) code
//! - [`PackageMetadata`] -- Record of a downloaded, verified package
//! - [`RevocationEntry`] -- Server-issued ETag revocation marker
//! - [`CheckinWindow`] -- Locally relevant time window

pub mod checkin;
pub mod error;
pub mod metadata;
pub mod package;
pub mod region;

pub use checkin::{earliest_relevant_package, CheckinWindow};
pub use error::TypeError;
pub use metadata::{PackageMetadata, RevocationEntry};
pub use package::{AvailableRange, PackageId, BUCKET_SECS};
pub use region::Region;
