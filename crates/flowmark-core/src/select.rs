//! Flow selection: random choice among sufficient flows, skipping any
//! already claimed in this run.

use std::collections::HashSet;

use rand::Rng;

use crate::catalog::CapacityError;
use crate::table::FlowKey;

/// Pick a uniformly random candidate not in `used`.
///
/// A claimed pick is dropped from the working set and the draw repeats.
/// The returned key is NOT inserted into `used`; the caller claims it
/// once the payload is embedded and validated.
pub fn select<R: Rng + ?Sized>(
    candidates: &[FlowKey],
    used: &HashSet<FlowKey>,
    rng: &mut R,
) -> Result<FlowKey, CapacityError> {
    let mut working: Vec<&FlowKey> = candidates.iter().collect();

    while !working.is_empty() {
        let pick = rng.gen_range(0..working.len());
        if !used.contains(working[pick]) {
            return Ok(working[pick].clone());
        }
        tracing::debug!(flow = %working[pick], "candidate already claimed, redrawing");
        working.swap_remove(pick);
    }

    Err(CapacityError::AllClaimed {
        candidates: candidates.len(),
    })
}
