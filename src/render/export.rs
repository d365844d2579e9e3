//! Track export
//!
//! Encoding is the last step and the only one that can fail after a
//! successful render. Exporters borrow the track, so a failed export can be
//! retried without rendering again.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::engine::io::{write_wav, ExportFormat};
use crate::error::{DubError, Result};
use crate::render::compositor::Track;

/// Result of writing one track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub bytes: u64,
    /// SHA-256 of the encoded file, lowercase hex
    pub sha256: String,
}

/// Serializes a finished track
pub trait TrackExporter {
    /// Encode the track into an in-memory byte stream
    fn encode(&self, track: &Track) -> Result<Vec<u8>>;

    /// Encode the track and write it to `path`
    fn export(&self, track: &Track, path: &Path) -> Result<ExportSummary> {
        let bytes = self.encode(track)?;
        std::fs::write(path, &bytes).map_err(|e| DubError::Export {
            reason: format!("Cannot write {}: {}", path.display(), e),
            source: Some(Box::new(e)),
        })?;

        let summary = ExportSummary {
            path: path.to_path_buf(),
            bytes: bytes.len() as u64,
            sha256: sha256_hex(&bytes),
        };
        info!(
            "Exported {} ({} bytes, sha256 {})",
            path.display(),
            summary.bytes,
            summary.sha256
        );
        Ok(summary)
    }
}

/// PCM/float WAV via hound
#[derive(Debug, Clone, Copy, Default)]
pub struct WavExporter {
    format: ExportFormat,
}

impl WavExporter {
    pub fn new(format: ExportFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }
}

impl TrackExporter for WavExporter {
    fn encode(&self, track: &Track) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        write_wav(track.buffer(), &mut cursor, self.format)?;
        Ok(cursor.into_inner())
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
