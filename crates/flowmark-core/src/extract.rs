//! Reads a flow's carrier fields back into bytes.
//!
//! Read-only. Used for real extraction and for the post-embed check.

use crate::catalog::FlowCatalog;
use crate::chunk::CHUNK_SIZE;
use crate::table::{FlowKey, FlowTable};

/// Read at least `byte_count` bytes from `flow`, two per packet.
///
/// Stops at the first packet that brings the buffer to `byte_count` or
/// beyond, so the result may be one byte longer than asked for. A flow
/// with too few packets yields a shorter buffer.
pub fn extract(
    byte_count: usize,
    flow: &FlowKey,
    table: &FlowTable,
    catalog: &FlowCatalog,
) -> Result<Vec<u8>, ExtractError> {
    if !catalog.matches(table) {
        return Err(ExtractError::StaleCatalog {
            indexed: catalog.record_count(),
            actual: table.len(),
        });
    }

    let indices = catalog
        .indices(flow)
        .ok_or_else(|| ExtractError::UnknownFlow(flow.clone()))?;

    // A flow can never yield more than its own packets carry.
    let mut data = Vec::with_capacity(byte_count.min(indices.len() * CHUNK_SIZE));
    for &index in indices {
        if data.len() >= byte_count {
            break;
        }
        let Some(record) = table.get(index) else {
            break;
        };
        let value = u16::try_from(record.id).map_err(|_| ExtractError::CarrierOutOfRange {
            index,
            id: record.id,
        })?;
        data.extend_from_slice(&value.to_be_bytes());
    }
    Ok(data)
}

/// Like `extract`, truncated to exactly `byte_count` when the flow holds
/// enough packets.
pub fn extract_exact(
    byte_count: usize,
    flow: &FlowKey,
    table: &FlowTable,
    catalog: &FlowCatalog,
) -> Result<Vec<u8>, ExtractError> {
    let mut data = extract(byte_count, flow, table, catalog)?;
    data.truncate(byte_count);
    Ok(data)
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("flow {0} is not in the catalog")]
    UnknownFlow(FlowKey),
    #[error("record {index} carries id {id:#x}, which does not fit in 16 bits")]
    CarrierOutOfRange { index: usize, id: u32 },
    #[error("catalog was built from a different table ({indexed} records indexed, table has {actual})")]
    StaleCatalog { indexed: usize, actual: usize },
}
