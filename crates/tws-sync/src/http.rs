use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use tws_protocol::{
    discovery_path, headers, is_empty_marker, normalize_etag, package_path, DiscoveryResponse,
    PackageCodec,
};
use tws_types::{AvailableRange, PackageId, Region};

use crate::transport::{PackageResponse, PackageTransport, TransportError, TransportResult};

/// HTTP transport against a package distribution server.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str) -> TransportResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        debug!(%url, status = status.as_u16(), "GET");
        Ok(response)
    }
}

#[async_trait]
impl PackageTransport for HttpTransport {
    async fn discover(&self, region: &Region) -> TransportResult<AvailableRange> {
        let response = self.get(&discovery_path(region)).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let discovery =
            DiscoveryResponse::decode(&body).map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(discovery.into())
    }

    async fn fetch_package(
        &self,
        region: &Region,
        id: PackageId,
    ) -> TransportResult<PackageResponse> {
        let response = self.get(&package_path(region, id)).await?;
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let etag = header(headers::ETAG)
            .map(|raw| normalize_etag(&raw))
            .filter(|etag| !etag.is_empty());
        let empty_marker = header(headers::EMPTY_PACKAGE)
            .map(|v| is_empty_marker(&v))
            .unwrap_or(false);

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        if empty_marker || body.is_empty() {
            return Ok(PackageResponse {
                package: None,
                etag,
            });
        }
        let package =
            PackageCodec::decode(&body).map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(PackageResponse {
            package: Some(package),
            etag,
        })
    }
}
