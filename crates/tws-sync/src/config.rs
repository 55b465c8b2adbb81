use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tws_crypto::Ed25519PackageVerifier;
use tws_types::Region;

use crate::error::{SyncError, SyncResult};
use crate::reconciler::StaticRevocations;

/// Configuration for a sync client.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Base URL of the package distribution server.
    pub base_url: String,
    /// Regions to synchronize.
    pub regions: Vec<Region>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Hex-encoded Ed25519 public keys trusted to sign packages.
    pub verifying_keys: Vec<String>,
    /// ETags the server has revoked.
    pub revoked_etags: Vec<String>,
    /// Directory holding metadata and downloaded packages.
    pub state_dir: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".into(),
            regions: vec![Region::new("DE").expect("static region code")],
            request_timeout_secs: 30,
            verifying_keys: Vec::new(),
            revoked_etags: Vec::new(),
            state_dir: PathBuf::from(".tws"),
        }
    }
}

impl SyncConfig {
    /// Load from a TOML file. A missing file yields the unvalidated defaults.
    pub fn load(path: impl AsRef<Path>) -> SyncResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> SyncResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| SyncError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.regions.is_empty() {
            return Err(SyncError::Config("at least one region is required".into()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(SyncError::Config(format!(
                "base_url must be an http(s) URL: {}",
                self.base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(SyncError::Config("request_timeout_secs must be positive".into()));
        }
        // Without a trusted key every package would fail verification.
        if self.verifying_keys.is_empty() {
            return Err(SyncError::Config("at least one verifying key is required".into()));
        }
        self.verifier()?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn verifier(&self) -> SyncResult<Ed25519PackageVerifier> {
        Ok(Ed25519PackageVerifier::from_hex_keys(&self.verifying_keys)?)
    }

    pub fn revocations(&self) -> StaticRevocations {
        StaticRevocations::from_etags(&self.revoked_etags)
    }

    pub fn packages_dir(&self) -> PathBuf {
        self.state_dir.join("packages")
    }
}
