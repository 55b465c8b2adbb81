//! Wire format for trace warning package distribution.
//!
//! Defines the discovery body, the signed-package container framing, and
//! the HTTP paths and headers shared by clients and test servers.

pub mod container;
pub mod discovery;
pub mod endpoint;
pub mod error;

pub use container::{PackageCodec, SignedPackage, CONTAINER_VERSION, MAX_CONTAINER_SIZE};
pub use discovery::DiscoveryResponse;
pub use endpoint::{
    discovery_path, endpoints, headers, is_empty_marker, normalize_etag, package_path,
};
pub use error::{ProtocolError, ProtocolResult};
