//! On-disk model artifact
//!
//! Layout:
//!
//! ```text
//! [ magic: 8 bytes ][ version: u32 LE ][ sha256(payload): 32 bytes ][ payload ]
//! ```
//!
//! The payload is the bincode encoding of [`ModelArtifact`], gzip compressed.
//! Files are replaced atomically so a crashed save never leaves a torn
//! artifact behind.

use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tourfusion_core::{Error, Result};
use tracing::{debug, info};

use crate::classifier::Ensemble;
use crate::labels::LabelTable;

pub const MAGIC: &[u8; 8] = b"TFMODEL\0";
pub const FORMAT_VERSION: u32 = 1;

const HEADER_LEN: usize = 8 + 4 + 32;

/// Everything needed to restore a trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub created_at: DateTime<Utc>,
    /// Input row width the ensemble was fitted on
    pub feature_dim: usize,
    pub labels: LabelTable,
    pub ensemble: Ensemble,
}

impl ModelArtifact {
    pub fn new(labels: LabelTable, ensemble: Ensemble) -> Self {
        Self {
            created_at: Utc::now(),
            feature_dim: ensemble.n_features(),
            labels,
            ensemble,
        }
    }

    /// Encode into the framed on-disk representation
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let raw = bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw)?;
        let payload = encoder.finish()?;

        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&Sha256::digest(&payload));
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    /// Decode a framed artifact, checking magic, version and checksum first
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::Persistence(format!(
                "artifact truncated: {} bytes, header needs {}",
                bytes.len(),
                HEADER_LEN
            )));
        }
        if bytes[..8] != MAGIC[..] {
            return Err(Error::Persistence("not a model artifact (bad magic)".to_string()));
        }

        let mut version = [0u8; 4];
        version.copy_from_slice(&bytes[8..12]);
        let found = u32::from_le_bytes(version);
        if found != FORMAT_VERSION {
            return Err(Error::VersionMismatch {
                expected: FORMAT_VERSION,
                found,
            });
        }

        let checksum = &bytes[12..HEADER_LEN];
        let payload = &bytes[HEADER_LEN..];
        if Sha256::digest(payload).as_slice() != checksum {
            return Err(Error::Persistence("checksum mismatch, artifact is corrupt".to_string()));
        }

        let mut raw = Vec::new();
        GzDecoder::new(payload)
            .read_to_end(&mut raw)
            .map_err(|e| Error::Persistence(format!("decompression failed: {}", e)))?;
        let artifact: ModelArtifact =
            bincode::deserialize(&raw).map_err(|e| Error::Persistence(format!("decode failed: {}", e)))?;

        if artifact.ensemble.n_features() != artifact.feature_dim {
            return Err(Error::InvalidDimension {
                expected: artifact.feature_dim,
                actual: artifact.ensemble.n_features(),
            });
        }
        Ok(artifact)
    }

    /// Write to `path`, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let bytes = self.to_bytes()?;

        AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
            .write(|f| f.write_all(&bytes))
            .map_err(|e| Error::Persistence(format!("failed to write {}: {}", path.display(), e)))?;

        info!(
            path = %path.display(),
            bytes = bytes.len(),
            kind = self.ensemble.kind(),
            labels = self.labels.len(),
            "saved model artifact"
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let artifact = Self::from_bytes(&bytes)?;
        debug!(
            path = %path.display(),
            kind = artifact.ensemble.kind(),
            created_at = %artifact.created_at,
            "loaded model artifact"
        );
        Ok(artifact)
    }
}
