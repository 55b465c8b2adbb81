use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

pub const CONTAINER_VERSION: u8 = 1;
pub const MAX_CONTAINER_SIZE: usize = 64 * 1024 * 1024;

const HEADER_LEN: usize = 5;
const TRAILER_LEN: usize = 4;

/// A package payload together with its detached signature.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPackage {
    pub bin: Vec<u8>,
    pub signature: Vec<u8>,
}

impl SignedPackage {
    pub fn new(bin: impl Into<Vec<u8>>, signature: impl Into<Vec<u8>>) -> Self {
        Self {
            bin: bin.into(),
            signature: signature.into(),
        }
    }
}

impl std::fmt::Debug for SignedPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedPackage")
            .field("bin_len", &self.bin.len())
            .field("signature_len", &self.signature.len())
            .finish()
    }
}

/// Codec for the signed-package container.
///
/// Layout: `[4 bytes len][1 byte version][payload][4 bytes crc32(payload)]`
/// where `len` counts the version byte and the payload.
pub struct PackageCodec;

impl PackageCodec {
    pub fn encode(package: &SignedPackage) -> ProtocolResult<Vec<u8>> {
        let payload = bincode::serialize(package)
            .map_err(|e| ProtocolError::Serialization(e.to_string()))?;
        if payload.len() > MAX_CONTAINER_SIZE {
            return Err(ProtocolError::ContainerTooLarge {
                size: payload.len(),
                max: MAX_CONTAINER_SIZE,
            });
        }
        let len = (payload.len() + 1) as u32;
        let mut buf = Vec::with_capacity(HEADER_LEN + payload.len() + TRAILER_LEN);
        buf.extend_from_slice(&len.to_be_bytes());
        buf.push(CONTAINER_VERSION);
        buf.extend_from_slice(&payload);
        buf.extend_from_slice(&crc32fast::hash(&payload).to_be_bytes());
        Ok(buf)
    }

    /// Decode a complete container. Trailing bytes are a framing error.
    pub fn decode(data: &[u8]) -> ProtocolResult<SignedPackage> {
        if data.len() < HEADER_LEN + TRAILER_LEN {
            return Err(ProtocolError::FramingError("too short".into()));
        }
        let len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if len < 1 {
            return Err(ProtocolError::FramingError("zero-length frame".into()));
        }
        if len - 1 > MAX_CONTAINER_SIZE {
            return Err(ProtocolError::ContainerTooLarge {
                size: len - 1,
                max: MAX_CONTAINER_SIZE,
            });
        }
        let total = 4 + len + TRAILER_LEN;
        if data.len() != total {
            return Err(ProtocolError::FramingError(format!(
                "length mismatch: have {}, need {}",
                data.len(),
                total
            )));
        }
        let version = data[4];
        if version != CONTAINER_VERSION {
            return Err(ProtocolError::UnsupportedVersion(version));
        }
        let payload = &data[HEADER_LEN..4 + len];
        let trailer = &data[4 + len..];
        let expected = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let actual = crc32fast::hash(payload);
        if expected != actual {
            return Err(ProtocolError::ChecksumMismatch { expected, actual });
        }
        bincode::deserialize(payload).map_err(|e| ProtocolError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SignedPackage {
        SignedPackage::new(b"warning-payload".to_vec(), vec![0xAB; 64])
    }

    #[test]
    fn roundtrip() {
        let encoded = PackageCodec::encode(&sample()).unwrap();
        assert_eq!(PackageCodec::decode(&encoded).unwrap(), sample());
    }

    #[test]
    fn decode_truncated() {
        let err = PackageCodec::decode(&[0, 0, 0]).unwrap_err();
        assert!(matches!(err, ProtocolError::FramingError(_)));
    }

    #[test]
    fn decode_zero_length() {
        let data = [0u8, 0, 0, 0, 1, 0, 0, 0, 0];
        let err = PackageCodec::decode(&data).unwrap_err();
        assert!(matches!(err, ProtocolError::FramingError(_)));
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let mut encoded = PackageCodec::encode(&sample()).unwrap();
        encoded.push(0);
        assert!(matches!(
            PackageCodec::decode(&encoded),
            Err(ProtocolError::FramingError(_))
        ));
    }

    #[test]
    fn decode_rejects_unknown_version() {
        let mut encoded = PackageCodec::encode(&sample()).unwrap();
        encoded[4] = 9;
        assert_eq!(
            PackageCodec::decode(&encoded).unwrap_err(),
            ProtocolError::UnsupportedVersion(9)
        );
    }

    #[test]
    fn decode_detects_corruption() {
        let mut encoded = PackageCodec::encode(&sample()).unwrap();
        let mid = encoded.len() / 2;
        encoded[mid] ^= 0xFF;
        assert!(matches!(
            PackageCodec::decode(&encoded),
            Err(ProtocolError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn debug_hides_payload() {
        let debug = format!("{:?}", sample());
        assert!(debug.contains("bin_len"));
        assert!(!debug.contains("171"));
    }
}
