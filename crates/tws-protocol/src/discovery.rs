use serde::{Deserialize, Serialize};
use tws_types::{AvailableRange, PackageId};

use crate::error::{ProtocolError, ProtocolResult};

/// JSON body of the discovery endpoint: `{"oldest": n, "latest": n}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    pub oldest: PackageId,
    pub latest: PackageId,
}

impl DiscoveryResponse {
    pub fn decode(body: &[u8]) -> ProtocolResult<Self> {
        serde_json::from_slice(body).map_err(|e| ProtocolError::Deserialization(e.to_string()))
    }

    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ProtocolError::Serialization(e.to_string()))
    }
}

impl From<DiscoveryResponse> for AvailableRange {
    fn from(body: DiscoveryResponse) -> Self {
        AvailableRange {
            oldest: body.oldest,
            latest: body.latest,
        }
    }
}

impl From<AvailableRange> for DiscoveryResponse {
    fn from(range: AvailableRange) -> Self {
        Self {
            oldest: range.oldest,
            latest: range.latest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_server_body() {
        let body = br#"{"oldest":449005,"latest":449010}"#;
        let range: AvailableRange = DiscoveryResponse::decode(body).unwrap().into();
        assert_eq!(range, AvailableRange::new(449_005, 449_010));
    }

    #[test]
    fn decodes_empty_catalog() {
        let body = br#"{"oldest":449011,"latest":449010}"#;
        let range: AvailableRange = DiscoveryResponse::decode(body).unwrap().into();
        assert!(range.is_empty());
    }

    #[test]
    fn rejects_malformed_body() {
        assert!(matches!(
            DiscoveryResponse::decode(br#"{"oldest":"x"}"#),
            Err(ProtocolError::Deserialization(_))
        ));
        assert!(DiscoveryResponse::decode(b"").is_err());
    }
}
