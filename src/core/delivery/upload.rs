//! Platform upload boundary. [`PlatformUploader`] is the trait seam; [`SimulatedUploader`] is
//! a documented fake used in tests and as the default
//! until a real client is wired in.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use async_trait::async_trait;

use crate::error::{SonarGateError, SonarGateResult};

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    /// Platform-assigned identifier for the uploaded asset.
    pub upload_id: String,
    /// Public (or platform-internal) URL for the uploaded asset.
    pub url: String,
}

/// Uploads a prepared asset to a named platform.
#[async_trait]
pub trait PlatformUploader: Send + Sync {
    /// Upload `asset_path` to `platform`, returning a receipt on success.
    async fn upload(&self, platform: &str, asset_path: &Path) -> SonarGateResult<UploadReceipt>;
}

/// Simulated uploader: a documented fake with a fixed simulated failure
/// rate, deterministic-per-call via a fresh random seed (no network I/O).
pub struct SimulatedUploader {
    /// Fraction of uploads that simulate failure, in `[0,1]`.
    failure_rate: f64,
}

impl Default for SimulatedUploader {
    fn default() -> Self {
        Self { failure_rate: 0.1 }
    }
}

impl SimulatedUploader {
    /// Construct a simulated uploader with a custom failure rate.
    pub fn with_failure_rate(failure_rate: f64) -> Self {
        Self {
            failure_rate: failure_rate.clamp(0.0, 1.0),
        }
    }
}

fn pseudo_random_unit() -> f64 {
    let seed = uuid::Uuid::new_v4().to_string();
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    (hasher.finish() % 1_000_000) as f64 / 1_000_000.0
}

#[async_trait]
impl PlatformUploader for SimulatedUploader {
    async fn upload(&self, platform: &str, asset_path: &Path) -> SonarGateResult<UploadReceipt> {
        if pseudo_random_unit() < self.failure_rate {
            return Err(SonarGateError::system(format!(
                "simulated upload failure for platform {platform}"
            )));
        }
        let upload_id = uuid::Uuid::new_v4().to_string();
        Ok(UploadReceipt {
            url: format!(
                "https://uploads.example.invalid/{platform}/{upload_id}/{}",
                asset_path.file_name().and_then(|n| n.to_str()).unwrap_or("asset")
            ),
            upload_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_failure_rate_always_succeeds() {
        let uploader = SimulatedUploader::with_failure_rate(0.0);
        let receipt = uploader.upload("spotify", Path::new("track.wav")).await.unwrap();
        assert!(receipt.url.contains("spotify"));
    }

    #[tokio::test]
    async fn full_failure_rate_always_fails() {
        let uploader = SimulatedUploader::with_failure_rate(1.0);
        assert!(uploader.upload("spotify", Path::new("track.wav")).await.is_err());
    }
}
