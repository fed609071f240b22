//! Embedding orchestrator: places one payload file per slot.
//!
//! Per slot:
//!   PENDING_FILE → SELECTING_FLOW → EMBEDDING → VALIDATING → ASSIGNED
//!                        │
//!                        └─ no capacity → RETRY (redraw files, same slot)
//!
//! Slots already ASSIGNED are never revisited, so a failed run leaves the
//! table embedded for exactly the assignments it reports.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::catalog::{CapacityError, FlowCatalog};
use crate::chunk::{chunk, strip_padding};
use crate::config::EmbedSettings;
use crate::embed::{embed, EmbedError};
use crate::extract::{extract, ExtractError};
use crate::select::select;
use crate::table::{FlowKey, FlowTable};

/// A payload placed into a flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub slot: usize,
    pub payload: PathBuf,
    pub flow: FlowKey,
    pub bytes: usize,
    /// BLAKE3 digest of the payload bytes.
    pub digest: [u8; 32],
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub assignments: Vec<Assignment>,
    /// Reassignment attempts consumed.
    pub retries: u32,
}

pub struct Orchestrator {
    settings: EmbedSettings,
    rng: StdRng,
}

impl Orchestrator {
    /// Seeded from `settings.seed`, or from OS entropy when unset.
    pub fn new(settings: EmbedSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { settings, rng }
    }

    /// Embed `num_flows` payloads drawn from `files` into `table`.
    ///
    /// Every file is checked before the table is touched.
    pub fn run(
        &mut self,
        table: &mut FlowTable,
        files: &[PathBuf],
        num_flows: usize,
    ) -> Result<RunReport, RunError> {
        if num_flows == 0 || files.is_empty() {
            return Err(RunError::NothingToEmbed);
        }
        for path in files {
            if !path.is_file() {
                return Err(RunError::MissingInput { path: path.clone() });
            }
        }

        let catalog = FlowCatalog::build(table);
        let mut plan = pick_files(files.len(), num_flows, &mut self.rng);
        let mut used: HashSet<FlowKey> = HashSet::new();
        let mut assigned: Vec<Assignment> = Vec::with_capacity(num_flows);
        let mut retries = 0u32;

        tracing::info!(
            flows = num_flows,
            files = files.len(),
            packets = table.len(),
            "embedding run started"
        );

        let mut slot = 0;
        while slot < num_flows {
            let path = &files[plan[slot]];
            let data = std::fs::read(path).map_err(|e| RunError::ReadPayload {
                path: path.clone(),
                source: e,
            })?;

            let flow = match catalog
                .candidate_flows(data.len(), self.settings.bytes_per_packet)
                .and_then(|candidates| select(&candidates, &used, &mut self.rng))
            {
                Ok(flow) => flow,
                Err(reason) => {
                    // With one file per slot a redraw cannot change anything.
                    if files.len() == num_flows || retries >= self.settings.max_retries {
                        return Err(RunError::RetryBudgetExhausted {
                            slot,
                            payload: path.clone(),
                            required_bytes: data.len(),
                            retries,
                            reason,
                            assigned,
                        });
                    }
                    retries += 1;
                    tracing::warn!(
                        slot,
                        payload = %path.display(),
                        bytes = data.len(),
                        retry = retries,
                        error = %reason,
                        "no flow for payload, redrawing files"
                    );
                    redraw(&mut plan, slot, files.len(), &mut self.rng);
                    continue;
                }
            };

            embed(&chunk(&data), &flow, table, &catalog)
                .map_err(|source| RunError::Embed { slot, source })?;

            if self.settings.validate {
                validate(slot, &data, &flow, table, &catalog)?;
            }

            tracing::info!(slot, payload = %path.display(), bytes = data.len(), flow = %flow, "payload assigned");
            used.insert(flow.clone());
            assigned.push(Assignment {
                slot,
                payload: path.clone(),
                flow,
                bytes: data.len(),
                digest: *blake3::hash(&data).as_bytes(),
            });
            slot += 1;
        }

        Ok(RunReport {
            assignments: assigned,
            retries,
        })
    }
}

/// Compare the flow's contents against the payload, modulo zero padding.
fn validate(
    slot: usize,
    data: &[u8],
    flow: &FlowKey,
    table: &FlowTable,
    catalog: &FlowCatalog,
) -> Result<(), RunError> {
    let extracted =
        extract(data.len(), flow, table, catalog).map_err(|source| RunError::Extract { slot, source })?;
    if strip_padding(&extracted) != strip_padding(data) {
        return Err(RunError::Validation {
            slot,
            flow: flow.clone(),
            expected_bytes: data.len(),
            extracted_bytes: extracted.len(),
        });
    }
    Ok(())
}

/// Assign file indices to `slots` slots.
///
/// More files than slots: distinct files, randomly sampled.
/// Fewer: drawn with replacement. Equal: every file once, in order.
fn pick_files<R: Rng + ?Sized>(files: usize, slots: usize, rng: &mut R) -> Vec<usize> {
    use std::cmp::Ordering;
    match files.cmp(&slots) {
        Ordering::Greater => {
            let mut pool: Vec<usize> = (0..files).collect();
            pool.shuffle(rng);
            pool.truncate(slots);
            pool
        }
        Ordering::Less => (0..slots).map(|_| rng.gen_range(0..files)).collect(),
        Ordering::Equal => (0..files).collect(),
    }
}

/// Redraw the files for `plan[from..]`, leaving assigned slots alone.
/// When sampling without replacement, files already assigned are excluded.
fn redraw<R: Rng + ?Sized>(plan: &mut [usize], from: usize, files: usize, rng: &mut R) {
    let slots = plan.len();
    if files > slots {
        let taken: HashSet<usize> = plan[..from].iter().copied().collect();
        let mut pool: Vec<usize> = (0..files).filter(|i| !taken.contains(i)).collect();
        pool.shuffle(rng);
        plan[from..].copy_from_slice(&pool[..slots - from]);
    } else {
        for entry in &mut plan[from..] {
            *entry = rng.gen_range(0..files);
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("nothing to embed: need at least one flow and one payload file")]
    NothingToEmbed,
    #[error("payload {} does not exist or is not a file", .path.display())]
    MissingInput { path: PathBuf },
    #[error("failed to read payload {}: {source}", .path.display())]
    ReadPayload {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("slot {slot}: {source}")]
    Embed { slot: usize, source: EmbedError },
    #[error("slot {slot}: {source}")]
    Extract { slot: usize, source: ExtractError },
    #[error(
        "slot {slot}: flow {flow} does not reproduce the payload \
         ({expected_bytes} bytes embedded, {extracted_bytes} read back)"
    )]
    Validation {
        slot: usize,
        flow: FlowKey,
        expected_bytes: usize,
        extracted_bytes: usize,
    },
    #[error(
        "could not place payload {} ({required_bytes} bytes) in slot {slot} after {retries} retries: {reason}",
        .payload.display()
    )]
    RetryBudgetExhausted {
        slot: usize,
        payload: PathBuf,
        required_bytes: usize,
        retries: u32,
        reason: CapacityError,
        /// Payloads embedded before the failure. The table still holds them.
        assigned: Vec<Assignment>,
    },
}

impl RunError {
    /// The payload this error is about, if any.
    pub fn payload(&self) -> Option<&Path> {
        match self {
            RunError::MissingInput { path } | RunError::ReadPayload { path, .. } => Some(path),
            RunError::RetryBudgetExhausted { payload, .. } => Some(payload),
            _ => None,
        }
    }
}
