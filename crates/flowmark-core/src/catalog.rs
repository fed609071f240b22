//! Flow catalog: per-flow packet index and capacity statistics.
//!
//! Built once per run. Every record index lands in exactly one flow's
//! list, in capture order, so the embedder and extractor visit a flow's
//! packets without rescanning the table.

use std::collections::HashMap;

use crate::table::{FlowKey, FlowTable};

/// Payload bytes carried per packet. Fixed by the 16-bit carrier.
pub const BYTES_PER_PACKET: usize = crate::chunk::CHUNK_SIZE;

/// Per-flow summary, as reported by `FlowCatalog::summary`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowStats {
    pub key: FlowKey,
    pub packets: usize,
    pub capacity_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct FlowCatalog {
    flows: HashMap<FlowKey, Vec<usize>>,
    record_count: usize,
    /// Digest of every record's flow key in table order. Carrier values are
    /// left out, so embedding never changes it.
    layout: [u8; 32],
}

impl FlowCatalog {
    /// Group every record of `table` by flow key.
    pub fn build(table: &FlowTable) -> Self {
        let mut flows: HashMap<FlowKey, Vec<usize>> = HashMap::new();
        for (index, record) in table.records().iter().enumerate() {
            flows.entry(record.flow_key()).or_default().push(index);
        }
        tracing::debug!(records = table.len(), flows = flows.len(), "flow catalog built");
        Self {
            flows,
            record_count: table.len(),
            layout: layout_digest(table),
        }
    }

    /// Number of distinct flows.
    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Number of records in the table this catalog was built from.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// True if `table` still has the records this catalog indexes: same
    /// length, and the same flow key at every position.
    pub fn matches(&self, table: &FlowTable) -> bool {
        self.record_count == table.len() && self.layout == layout_digest(table)
    }

    /// Record indices of `key`, in capture order.
    pub fn indices(&self, key: &FlowKey) -> Option<&[usize]> {
        self.flows.get(key).map(Vec::as_slice)
    }

    /// Packet count per flow. Counts sum to the table length.
    pub fn capacities(&self) -> HashMap<FlowKey, usize> {
        self.flows
            .iter()
            .map(|(key, indices)| (key.clone(), indices.len()))
            .collect()
    }

    /// Flows able to carry `required_bytes`, smallest first.
    ///
    /// Ties on packet count are broken by key order so the list is
    /// reproducible.
    pub fn candidate_flows(
        &self,
        required_bytes: usize,
        bytes_per_packet: usize,
    ) -> Result<Vec<FlowKey>, CapacityError> {
        let mut candidates: Vec<(&FlowKey, usize)> = self
            .flows
            .iter()
            .map(|(key, indices)| (key, indices.len()))
            .filter(|(_, packets)| packets.saturating_mul(bytes_per_packet) >= required_bytes)
            .collect();

        if candidates.is_empty() {
            let largest_capacity = self
                .flows
                .values()
                .map(|indices| indices.len().saturating_mul(bytes_per_packet))
                .max()
                .unwrap_or(0);
            return Err(CapacityError::NoSufficientFlow {
                required_bytes,
                largest_capacity,
            });
        }

        candidates.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        Ok(candidates.into_iter().map(|(key, _)| key.clone()).collect())
    }

    /// Stats for every flow, largest first.
    pub fn summary(&self) -> Vec<FlowStats> {
        let mut stats: Vec<FlowStats> = self
            .flows
            .iter()
            .map(|(key, indices)| FlowStats {
                key: key.clone(),
                packets: indices.len(),
                capacity_bytes: indices.len() * BYTES_PER_PACKET,
            })
            .collect();
        stats.sort_by(|a, b| b.packets.cmp(&a.packets).then_with(|| a.key.cmp(&b.key)));
        stats
    }
}

fn layout_digest(table: &FlowTable) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for record in table.records() {
        for addr in [&record.srcaddr, &record.dstaddr] {
            hasher.update(&(addr.len() as u64).to_le_bytes());
            hasher.update(addr.as_bytes());
        }
        hasher.update(&record.srcport.to_le_bytes());
        hasher.update(&record.dstport.to_le_bytes());
        hasher.update(&record.proto.to_le_bytes());
    }
    *hasher.finalize().as_bytes()
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// No flow can take the payload. Recoverable: the orchestrator retries
/// with a different payload-to-slot assignment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapacityError {
    #[error("no flow can hold {required_bytes} bytes (largest holds {largest_capacity})")]
    NoSufficientFlow {
        required_bytes: usize,
        largest_capacity: usize,
    },
    #[error("all {candidates} flows with enough capacity are already in use")]
    AllClaimed { candidates: usize },
}
