//! Embed manifest: which flow carries which payload.
//!
//! Written as JSON next to the output table. Extraction needs nothing
//! else: the flow key locates the packets, `bytes` gives the exact
//! length, and the BLAKE3 digest detects a table altered after embedding.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::orchestrator::Assignment;
use crate::table::FlowKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// File name of the table the payloads were embedded into.
    pub table: String,
    pub entries: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub slot: usize,
    /// Payload file name (no directory).
    pub payload: String,
    pub flow: FlowKey,
    pub bytes: usize,
    /// Hex BLAKE3 digest of the payload bytes.
    pub digest: String,
}

impl ManifestEntry {
    pub fn from_assignment(assignment: &Assignment) -> Self {
        let payload = assignment
            .payload
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| assignment.payload.display().to_string());
        Self {
            slot: assignment.slot,
            payload,
            flow: assignment.flow.clone(),
            bytes: assignment.bytes,
            digest: hex::encode(assignment.digest),
        }
    }

    /// True if `data` is exactly the payload this entry describes.
    pub fn verify(&self, data: &[u8]) -> bool {
        data.len() == self.bytes && hex::encode(blake3::hash(data).as_bytes()) == self.digest
    }

    /// Output file name for the extracted payload. Prefixed with the slot
    /// because one file may be embedded into several flows.
    pub fn output_name(&self) -> String {
        format!("{}_{}", self.slot, self.payload)
    }
}

impl Manifest {
    pub fn new(table: impl Into<String>, assignments: &[Assignment]) -> Self {
        Self {
            table: table.into(),
            entries: assignments.iter().map(ManifestEntry::from_assignment).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ManifestError::ReadFailed(path.to_path_buf(), e))?;
        serde_json::from_str(&text).map_err(|e| ManifestError::ParseFailed(path.to_path_buf(), e))
    }

    pub fn write(&self, path: &Path) -> Result<(), ManifestError> {
        let text = serde_json::to_string_pretty(self).map_err(ManifestError::SerializeFailed)?;
        std::fs::write(path, text).map_err(|e| ManifestError::WriteFailed(path.to_path_buf(), e))
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, serde_json::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(serde_json::Error),
}
