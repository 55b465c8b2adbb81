use async_trait::async_trait;
use thiserror::Error;
use tws_protocol::SignedPackage;
use tws_types::{AvailableRange, PackageId, Region};

/// Errors raised by a [`PackageTransport`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("undecodable response: {0}")]
    Decode(String),

    #[error("client setup failed: {0}")]
    Client(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// A successful package download.
///
/// `package == None` is the explicit "empty package" marker: the server
/// answered successfully but published no content for this bucket.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackageResponse {
    pub package: Option<SignedPackage>,
    pub etag: Option<String>,
}

impl PackageResponse {
    pub fn package(package: SignedPackage, etag: impl Into<String>) -> Self {
        Self {
            package: Some(package),
            etag: Some(etag.into()),
        }
    }

    pub fn empty(etag: impl Into<String>) -> Self {
        Self {
            package: None,
            etag: Some(etag.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.package.is_none()
    }
}

/// Transport interface for the remote package distribution.
///
/// Timeouts are the transport's concern and surface as errors.
#[async_trait]
pub trait PackageTransport: Send + Sync {
    /// Ids currently published for `region`.
    async fn discover(&self, region: &Region) -> TransportResult<AvailableRange>;

    /// Download one package.
    async fn fetch_package(&self, region: &Region, id: PackageId)
        -> TransportResult<PackageResponse>;
}
