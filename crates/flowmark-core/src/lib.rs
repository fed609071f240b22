//! flowmark-core: flow table model, carrier-field embedding, and extraction.
//! The ctl binary and the integration harness both build on this crate.

pub mod catalog;
pub mod chunk;
pub mod config;
pub mod embed;
pub mod extract;
pub mod manifest;
pub mod orchestrator;
pub mod select;
pub mod table;

pub use catalog::{CapacityError, FlowCatalog, FlowStats, BYTES_PER_PACKET};
pub use chunk::{chunk, strip_padding, unchunk, CHUNK_SIZE};
pub use config::{EmbedSettings, FlowmarkConfig, OutputSettings};
pub use embed::{embed, EmbedError};
pub use extract::{extract, extract_exact, ExtractError};
pub use manifest::{Manifest, ManifestEntry, ManifestError};
pub use orchestrator::{Assignment, Orchestrator, RunError, RunReport};
pub use select::select;
pub use table::{FlowKey, FlowTable, PacketRecord, TableError};
