//! Recover the payloads listed in a manifest.

use std::path::Path;

use anyhow::{bail, Context, Result};

use flowmark_core::{extract_exact, FlowCatalog, FlowTable, Manifest};

pub fn cmd_extract(table: &Path, manifest: &Path, out_dir: &Path) -> Result<()> {
    let table = FlowTable::load_csv(table)?;
    let manifest = Manifest::load(manifest)?;
    let catalog = FlowCatalog::build(&table);

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    let mut corrupted = Vec::new();
    for entry in &manifest.entries {
        let data = extract_exact(entry.bytes, &entry.flow, &table, &catalog)
            .with_context(|| format!("slot {}: failed to extract {}", entry.slot, entry.payload))?;

        if !entry.verify(&data) {
            tracing::warn!(slot = entry.slot, payload = %entry.payload, flow = %entry.flow, "digest mismatch");
            corrupted.push(entry.output_name());
            continue;
        }

        let path = out_dir.join(entry.output_name());
        std::fs::write(&path, &data)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("  ✓ {} ({} bytes)", path.display(), data.len());
    }

    if !corrupted.is_empty() {
        bail!(
            "{} payload(s) do not match their digest: {}",
            corrupted.len(),
            corrupted.join(", ")
        );
    }
    Ok(())
}
