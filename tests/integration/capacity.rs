use std::collections::HashSet;

use flowmark_core::{
    select, CapacityError, FlowCatalog, Orchestrator, RunError, BYTES_PER_PACKET,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::*;

/// Every packet belongs to exactly one flow's count.
#[test]
fn test_capacities_cover_every_packet() {
    let table = capture(&[1, 2, 3, 64, 10, 17]);
    let catalog = FlowCatalog::build(&table);

    let capacities = catalog.capacities();
    assert_eq!(capacities.len(), 6);
    assert_eq!(capacities.values().sum::<usize>(), table.len());
    assert_eq!(capacities[&flow(3)], 64);
}

/// Asking for more sufficient flows than exist never hands out an
/// under-capacity flow.
#[test]
fn test_selecting_past_sufficient_flows_is_no_capacity() {
    let table = capture(&[40, 40, 5, 5]);
    let catalog = FlowCatalog::build(&table);
    let mut rng = StdRng::seed_from_u64(12);
    let mut used = HashSet::new();

    let candidates = catalog.candidate_flows(60, BYTES_PER_PACKET).unwrap();
    assert_eq!(candidates.len(), 2);

    for _ in 0..2 {
        let picked = select(&candidates, &used, &mut rng).unwrap();
        assert!(catalog.capacities()[&picked] * BYTES_PER_PACKET >= 60);
        used.insert(picked);
    }

    assert_eq!(
        select(&candidates, &used, &mut rng),
        Err(CapacityError::AllClaimed { candidates: 2 })
    );
}

/// Through the orchestrator: three payloads, only two flows big enough,
/// one file per slot. The third slot cannot be placed.
#[test]
fn test_orchestrator_refuses_under_capacity_flow() {
    let scratch = Scratch::new("undercap");
    let files: Vec<_> = (0..3)
        .map(|i| scratch.write(&format!("p{i}"), &payload(60, i)))
        .collect();
    let mut table = capture(&[40, 40, 5, 5]);

    match Orchestrator::new(seeded(3)).run(&mut table, &files, 3) {
        Err(RunError::RetryBudgetExhausted {
            slot,
            reason,
            assigned,
            ..
        }) => {
            assert_eq!(slot, 2);
            assert_eq!(reason, CapacityError::AllClaimed { candidates: 2 });
            assert_eq!(assigned.len(), 2);
        }
        other => panic!("expected RetryBudgetExhausted, got {other:?}"),
    }
}

/// Flow keys are direction sensitive: a reply flow is a separate flow.
#[test]
fn test_reply_direction_is_a_separate_flow() {
    let mut table = capture(&[4]);
    let mut records = table.clone().into_records();
    let reply: Vec<_> = records
        .iter()
        .map(|r| {
            let mut r = r.clone();
            std::mem::swap(&mut r.srcaddr, &mut r.dstaddr);
            std::mem::swap(&mut r.srcport, &mut r.dstport);
            r
        })
        .collect();
    records.extend(reply);
    table = flowmark_core::FlowTable::new(records);

    let catalog = FlowCatalog::build(&table);
    assert_eq!(catalog.len(), 2);
    assert!(catalog.capacities().values().all(|&n| n == 4));
}
