use flowmark_core::config::manifest_path;
use flowmark_core::{
    extract_exact, FlowCatalog, FlowTable, FlowmarkConfig, Manifest, Orchestrator,
};

use crate::*;

/// Load → embed → save → reload → extract via manifest, byte exact.
#[test]
fn test_manifest_driven_extraction_after_reload() {
    let scratch = Scratch::new("persist");
    let input = scratch.path("cap.csv");
    capture(&[50, 50, 12]).write_csv(&input).unwrap();

    let originals = [payload(77, 1), payload(100, 2)];
    let files = vec![
        scratch.write("one.bin", &originals[0]),
        scratch.write("two.bin", &originals[1]),
    ];

    let config = FlowmarkConfig::default();
    let mut table = FlowTable::load_csv(&input).unwrap();
    let report = Orchestrator::new(seeded(17)).run(&mut table, &files, 2).unwrap();

    let output = config.output.output_path(&input, 2);
    assert_eq!(output, scratch.path("i2_cap.csv"));
    table.write_csv(&output).unwrap();

    let mpath = manifest_path(&output);
    Manifest::new("i2_cap.csv", &report.assignments)
        .write(&mpath)
        .unwrap();

    let reloaded = FlowTable::load_csv(&output).unwrap();
    assert_eq!(reloaded, table);

    let manifest = Manifest::load(&mpath).unwrap();
    let catalog = FlowCatalog::build(&reloaded);
    for entry in &manifest.entries {
        let data = extract_exact(entry.bytes, &entry.flow, &reloaded, &catalog).unwrap();
        assert!(entry.verify(&data), "slot {} digest mismatch", entry.slot);
        let expected = if entry.payload == "one.bin" {
            &originals[0]
        } else {
            &originals[1]
        };
        assert_eq!(&data, expected);
    }
}

/// Tampering with a carrier field after embedding is caught by the digest.
#[test]
fn test_tampered_table_fails_digest() {
    let scratch = Scratch::new("tamper");
    let file = scratch.write("p.bin", &payload(40, 8));
    let mut table = capture(&[30]);
    let report = Orchestrator::new(seeded(2))
        .run(&mut table, std::slice::from_ref(&file), 1)
        .unwrap();
    let manifest = Manifest::new("x.csv", &report.assignments);

    let path = scratch.path("t.csv");
    table.write_csv(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    // First data row belongs to the only flow and carries payload.
    let mut fields: Vec<&str> = lines[1].split(',').collect();
    let flipped = (fields[6].parse::<u32>().unwrap() ^ 0x0101).to_string();
    fields[6] = &flipped;
    lines[1] = fields.join(",");
    std::fs::write(&path, lines.join("\n") + "\n").unwrap();

    let tampered = FlowTable::load_csv(&path).unwrap();
    let catalog = FlowCatalog::build(&tampered);
    let entry = &manifest.entries[0];
    let data = extract_exact(entry.bytes, &entry.flow, &tampered, &catalog).unwrap();
    assert!(!entry.verify(&data));
}
