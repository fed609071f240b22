use flowmark_core::{EmbedSettings, FlowCatalog, Orchestrator, RunError};

use crate::*;

/// 3 files, 2 flows requested, both flows too small for every file: the
/// orchestrator burns the whole retry budget, then gives up.
#[test]
fn test_retry_budget_exhausted_when_nothing_fits() {
    let scratch = Scratch::new("budget");
    let files: Vec<_> = (0..3)
        .map(|i| scratch.write(&format!("big{i}.bin"), &payload(200, i)))
        .collect();
    let mut table = capture(&[20, 20]);
    let before = table.clone();

    let err = Orchestrator::new(seeded(21))
        .run(&mut table, &files, 2)
        .unwrap_err();

    match &err {
        RunError::RetryBudgetExhausted {
            slot,
            retries,
            required_bytes,
            assigned,
            payload,
            ..
        } => {
            assert_eq!(*slot, 0);
            assert_eq!(*retries, EmbedSettings::default().max_retries);
            assert_eq!(*required_bytes, 200);
            assert!(assigned.is_empty());
            assert!(files.contains(payload));
        }
        other => panic!("expected RetryBudgetExhausted, got {other:?}"),
    }
    assert!(err.payload().is_some());
    assert_eq!(table, before, "table changed by a run that placed nothing");
}

/// Files equal to flows: redrawing cannot help, so no retries are spent.
#[test]
fn test_equal_files_and_flows_fail_without_retrying() {
    let scratch = Scratch::new("failfast");
    let files = vec![
        scratch.write("a.bin", &payload(10, 1)),
        scratch.write("b.bin", &payload(10_000, 2)),
    ];
    let mut table = capture(&[30, 30]);

    match Orchestrator::new(seeded(4)).run(&mut table, &files, 2) {
        Err(RunError::RetryBudgetExhausted {
            retries, assigned, ..
        }) => {
            assert_eq!(retries, 0);
            assert_eq!(assigned.len(), 1);
        }
        other => panic!("expected RetryBudgetExhausted, got {other:?}"),
    }
}

/// A failed run keeps the payloads it placed before the failure.
#[test]
fn test_prior_assignments_survive_failure() {
    let scratch = Scratch::new("partial");
    let small = payload(12, 5);
    let files = vec![
        scratch.write("small.bin", &small),
        scratch.write("huge.bin", &payload(5_000, 6)),
    ];
    let mut table = capture(&[10, 10, 10]);

    let err = Orchestrator::new(seeded(6))
        .run(&mut table, &files, 2)
        .unwrap_err();
    let RunError::RetryBudgetExhausted { assigned, .. } = err else {
        panic!("expected RetryBudgetExhausted");
    };

    assert_eq!(assigned.len(), 1);
    let catalog = FlowCatalog::build(&table);
    let out = flowmark_core::extract_exact(12, &assigned[0].flow, &table, &catalog).unwrap();
    assert_eq!(out, small);
}

/// More files than flows: a redraw can swap an oversized file for one
/// that fits, and the run completes within budget.
#[test]
fn test_redraw_recovers_from_oversized_file() {
    let scratch = Scratch::new("recover");
    let mut files = vec![scratch.write("fits.bin", &payload(16, 1))];
    for i in 0..3 {
        files.push(scratch.write(&format!("huge{i}.bin"), &payload(1_000, i)));
    }
    let mut table = capture(&[8, 8, 8]);

    let report = Orchestrator::new(EmbedSettings {
        max_retries: 500,
        ..seeded(99)
    })
    .run(&mut table, &files, 1)
    .unwrap();

    assert_eq!(report.assignments.len(), 1);
    assert_eq!(report.assignments[0].payload, files[0]);
}

/// Same seed, same inputs, same assignments.
#[test]
fn test_runs_are_reproducible_with_a_seed() {
    let scratch = Scratch::new("repro");
    let files: Vec<_> = (0..5)
        .map(|i| scratch.write(&format!("f{i}"), &payload(20, i)))
        .collect();

    let run = |seed| {
        let mut table = capture(&[20, 20, 20, 20, 20, 20]);
        let report = Orchestrator::new(seeded(seed)).run(&mut table, &files, 3).unwrap();
        (report, table)
    };

    let (a, table_a) = run(31);
    let (b, table_b) = run(31);
    assert_eq!(a, b);
    assert_eq!(table_a, table_b);
}
