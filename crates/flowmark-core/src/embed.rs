//! Writes payload chunks into a flow's carrier fields.
//!
//! The i-th chunk goes into the i-th packet of the flow in capture order.
//! Capacity is checked before the first write, so a failed embed leaves
//! the table untouched.

use crate::catalog::FlowCatalog;
use crate::table::{FlowKey, FlowTable};

/// Embed `chunks` into `flow`. Returns the number of records rewritten.
///
/// Exactly `chunks.len()` records change; every record outside `flow`
/// keeps its identifier.
pub fn embed(
    chunks: &[u16],
    flow: &FlowKey,
    table: &mut FlowTable,
    catalog: &FlowCatalog,
) -> Result<usize, EmbedError> {
    if !catalog.matches(table) {
        return Err(EmbedError::StaleCatalog {
            indexed: catalog.record_count(),
            actual: table.len(),
        });
    }

    let indices = catalog
        .indices(flow)
        .ok_or_else(|| EmbedError::UnknownFlow(flow.clone()))?;

    if indices.len() < chunks.len() {
        return Err(EmbedError::InsufficientCapacity {
            flow: flow.clone(),
            chunks: chunks.len(),
            packets: indices.len(),
        });
    }

    for (&index, &value) in indices.iter().zip(chunks) {
        table.set_id(index, u32::from(value));
    }

    tracing::trace!(flow = %flow, records = chunks.len(), "chunks embedded");
    Ok(chunks.len())
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmbedError {
    #[error("flow {0} is not in the catalog")]
    UnknownFlow(FlowKey),
    #[error("flow {flow} has {packets} packets, {chunks} chunks to embed")]
    InsufficientCapacity {
        flow: FlowKey,
        chunks: usize,
        packets: usize,
    },
    #[error("catalog was built from a different table ({indexed} records indexed, table has {actual})")]
    StaleCatalog { indexed: usize, actual: usize },
}
