//! Flow table, the tabulated packet record everything else operates on.
//!
//! A table is produced by the ingestion tool as CSV with the header:
//!   time,srcaddr,dstaddr,srcport,dstport,proto,id
//!
//! Rows are in capture order. Only the `id` column is ever rewritten;
//! record count and order are preserved from load to save.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One captured packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketRecord {
    pub time: i64,
    /// Opaque address text. IPv4, IPv6, or anything else the capture held.
    pub srcaddr: String,
    pub dstaddr: String,
    pub srcport: u16,
    pub dstport: u16,
    pub proto: u16,
    /// Carrier field. Original identifiers may use the full 32 bits;
    /// embedded values always fit in 16.
    pub id: u32,
}

impl PacketRecord {
    /// The flow this packet belongs to.
    pub fn flow_key(&self) -> FlowKey {
        FlowKey {
            srcaddr: self.srcaddr.clone(),
            dstaddr: self.dstaddr.clone(),
            srcport: self.srcport,
            dstport: self.dstport,
            proto: self.proto,
        }
    }

    /// True if this packet belongs to `key`. Avoids allocating a key.
    pub fn in_flow(&self, key: &FlowKey) -> bool {
        self.srcport == key.srcport
            && self.dstport == key.dstport
            && self.proto == key.proto
            && self.srcaddr == key.srcaddr
            && self.dstaddr == key.dstaddr
    }
}

/// Direction-sensitive 5-tuple. (a→b) and (b→a) are different flows.
///
/// Field order defines the total order used to make candidate lists
/// reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlowKey {
    pub srcaddr: String,
    pub dstaddr: String,
    pub srcport: u16,
    pub dstport: u16,
    pub proto: u16,
}

impl FlowKey {
    pub fn new(
        srcaddr: impl Into<String>,
        dstaddr: impl Into<String>,
        srcport: u16,
        dstport: u16,
        proto: u16,
    ) -> Self {
        Self {
            srcaddr: srcaddr.into(),
            dstaddr: dstaddr.into(),
            srcport,
            dstport,
            proto,
        }
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{} proto {}",
            self.srcaddr, self.srcport, self.dstaddr, self.dstport, self.proto
        )
    }
}

/// Ordered packet records, mutable only through their `id` field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowTable {
    records: Vec<PacketRecord>,
}

impl FlowTable {
    pub fn new(records: Vec<PacketRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[PacketRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&PacketRecord> {
        self.records.get(index)
    }

    /// Overwrite the carrier field of one record. This is the only mutation
    /// a table supports.
    pub(crate) fn set_id(&mut self, index: usize, id: u32) {
        self.records[index].id = id;
    }

    /// Carrier values in table order. Handy for before/after comparisons.
    pub fn ids(&self) -> Vec<u32> {
        self.records.iter().map(|r| r.id).collect()
    }

    pub fn into_records(self) -> Vec<PacketRecord> {
        self.records
    }

    // ── CSV I/O ───────────────────────────────────────────────────────────────

    /// Load a table from a headered CSV file.
    pub fn load_csv(path: &Path) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| TableError::Open(path.to_path_buf(), e))?;

        let mut records = Vec::new();
        for (row, result) in reader.deserialize::<PacketRecord>().enumerate() {
            let record = result.map_err(|e| TableError::Parse {
                path: path.to_path_buf(),
                row: row + 1,
                source: e,
            })?;
            records.push(record);
        }

        tracing::debug!(path = %path.display(), records = records.len(), "flow table loaded");
        Ok(Self { records })
    }

    /// Write the table as headered CSV, preserving record order.
    pub fn write_csv(&self, path: &Path) -> Result<(), TableError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| TableError::Write(path.to_path_buf(), e))?;

        for record in &self.records {
            writer
                .serialize(record)
                .map_err(|e| TableError::Write(path.to_path_buf(), e))?;
        }
        writer
            .flush()
            .map_err(|e| TableError::Write(path.to_path_buf(), e.into()))?;

        tracing::debug!(path = %path.display(), records = self.records.len(), "flow table written");
        Ok(())
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("failed to open {0}: {1}")]
    Open(PathBuf, csv::Error),
    #[error("failed to parse {path} at record {row}: {source}")]
    Parse {
        path: PathBuf,
        row: usize,
        source: csv::Error,
    },
    #[error("failed to write {0}: {1}")]
    Write(PathBuf, csv::Error),
}
