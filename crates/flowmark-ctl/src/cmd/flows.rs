//! Catalog statistics for a table.

use std::path::Path;

use anyhow::Result;

use flowmark_core::{FlowCatalog, FlowTable};

pub fn cmd_flows(table: &Path, min_bytes: usize) -> Result<()> {
    let table = FlowTable::load_csv(table)?;
    let catalog = FlowCatalog::build(&table);

    println!("═══════════════════════════════════════");
    println!("  Flows ({}), {} packets", catalog.len(), table.len());
    println!("═══════════════════════════════════════");

    let stats: Vec<_> = catalog
        .summary()
        .into_iter()
        .filter(|s| s.capacity_bytes >= min_bytes)
        .collect();

    if stats.is_empty() {
        println!("  No flow can carry {} bytes.", min_bytes);
        return Ok(());
    }

    for s in &stats {
        println!(
            "  {:>8} packets  {:>8} bytes  {}",
            s.packets, s.capacity_bytes, s.key
        );
    }
    Ok(())
}
