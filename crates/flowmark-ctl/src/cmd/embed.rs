//! Place payload files into flows and write the output table.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use flowmark_core::config::manifest_path;
use flowmark_core::{Assignment, FlowTable, FlowmarkConfig, Manifest, Orchestrator, RunError};

pub fn cmd_embed(
    config: &FlowmarkConfig,
    num_flows: usize,
    input: &Path,
    payloads: &[PathBuf],
    output: Option<&Path>,
) -> Result<()> {
    let mut table = FlowTable::load_csv(input)?;

    let mut orchestrator = Orchestrator::new(config.embed.clone());
    let report = match orchestrator.run(&mut table, payloads, num_flows) {
        Ok(report) => report,
        Err(RunError::RetryBudgetExhausted {
            slot,
            payload,
            required_bytes,
            retries,
            reason,
            assigned,
        }) => {
            for a in &assigned {
                tracing::warn!(slot = a.slot, payload = %a.payload.display(), flow = %a.flow, "assigned before failure, not written");
            }
            anyhow::bail!(
                "failed to find appropriate flows/files: payload {} ({} bytes, slot {}) could not be placed after {} retries: {}",
                payload.display(),
                required_bytes,
                slot,
                retries,
                reason
            );
        }
        Err(e) => return Err(e.into()),
    };

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.output.output_path(input, num_flows));
    let manifest = config
        .output
        .write_manifest
        .then(|| write_staged_manifest(&output, &report.assignments))
        .transpose()?;

    if let Err(e) = table.write_csv(&output) {
        if let Some((staged, _)) = &manifest {
            let _ = std::fs::remove_file(staged);
        }
        return Err(e).with_context(|| format!("failed to write output table {}", output.display()));
    }
    if let Some((staged, path)) = &manifest {
        if let Err(e) = std::fs::rename(staged, path) {
            let _ = std::fs::remove_file(staged);
            let _ = std::fs::remove_file(&output);
            return Err(e).with_context(|| format!("failed to move manifest into {}", path.display()));
        }
    }

    println!("═══════════════════════════════════════");
    println!("  Embedded {} payload(s)", report.assignments.len());
    println!("═══════════════════════════════════════");
    for a in &report.assignments {
        println!("  ┌─ slot {}", a.slot);
        println!("  │  payload : {}", a.payload.display());
        println!("  │  bytes   : {}", a.bytes);
        println!("  └─ flow    : {}", a.flow);
    }
    if report.retries > 0 {
        println!("  Retries  : {}", report.retries);
    }
    println!("  Output   : {}", output.display());
    if let Some((_, path)) = &manifest {
        println!("  Manifest : {}", path.display());
    }

    Ok(())
}

/// Write the manifest beside `output` under a temporary name. Returns the
/// staged path and the final one. The table is only written once this
/// succeeds, and the manifest is only renamed into place once the table
/// is written, so a failed command never leaves one without the other.
fn write_staged_manifest(output: &Path, assignments: &[Assignment]) -> Result<(PathBuf, PathBuf)> {
    let table_name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let path = manifest_path(output);
    let mut staged = path.clone().into_os_string();
    staged.push(".tmp");
    let staged = PathBuf::from(staged);

    Manifest::new(table_name, assignments).write(&staged)?;
    Ok((staged, path))
}
