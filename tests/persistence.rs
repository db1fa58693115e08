//! Report persistence integration tests

mod common;

use arise::disasm::{load_frequencies, parse_program, DecodeConfig, InputFormat};
use arise::fusion::Width;
use arise::persistence::{RunReport, SynthesisReport};
use arise::pipeline::{SynthesisConfig, SynthesisPipeline};
use common::*;
use tempfile::tempdir;

fn static_run() -> RunReport {
    let program = parse_program(LISTING, InputFormat::Objdump, &DecodeConfig::default()).unwrap();
    let outcome = SynthesisPipeline::new().run(&program, None).unwrap();
    RunReport::from_outcome("prog.dump", None, &outcome)
}

#[test]
fn test_run_report_from_outcome() {
    let run = static_run();

    assert_eq!(run.metadata.input, "prog.dump");
    assert!(run.metadata.trace.is_none());
    assert!(!run.metadata.dynamic);
    assert_eq!(run.metadata.instruction_count, 6);
    assert_eq!(run.widths.len(), 2);

    let full = &run.widths[0];
    assert_eq!(full.width, Width::Full);
    assert_eq!(full.entries.len(), 1);

    let entry = &full.entries[0];
    assert_eq!(entry.rank, 0);
    assert_eq!(entry.name, "addi_add");
    assert_eq!(entry.template, vec!["addi", "add"]);
    assert_eq!(entry.score, 8.0);
    assert_eq!(entry.assembly, "{\"arise32.addi_add\", \"{name(rd)}, {name(rs1)}, {name(rs2)}, {imm}\"}");
    assert!((run.relative(full) - 33.333).abs() < 0.01);
}

#[test]
fn test_report_roundtrip_both_formats() {
    let dir = tempdir().unwrap();
    let report = SynthesisReport::new(SynthesisConfig::default(), vec![static_run()]);

    let bin_path = dir.path().join("report.bin");
    report.save_any(&bin_path).unwrap();
    let from_bin = SynthesisReport::load_any(&bin_path).unwrap();

    let json_path = dir.path().join("report.json");
    report.save_any(&json_path).unwrap();
    let from_json = SynthesisReport::load_any(&json_path).unwrap();
    let text = std::fs::read_to_string(&json_path).unwrap();
    assert!(text.contains("\"addi_add\""));

    for loaded in [from_bin, from_json] {
        assert_eq!(loaded.version, report.version);
        assert_eq!(loaded.config.isa, report.config.isa);
        assert_eq!(loaded.num_instructions(), report.num_instructions());
        assert_eq!(loaded.runs[0].metadata.timestamp, report.runs[0].metadata.timestamp);
        assert_eq!(loaded.runs[0].widths[1].entries[0].encoding, report.runs[0].widths[1].entries[0].encoding);
    }
}

#[test]
fn test_dynamic_run_records_trace() {
    let dir = tempdir().unwrap();
    let trace = write_file(dir.path(), "trace.txt", ETISS_TRACE);
    let config = SynthesisConfig::default();
    let program = parse_program(LISTING, InputFormat::Objdump, &config.decode).unwrap();
    let profile = load_frequencies(&trace, InputFormat::Etiss, &program, &config.decode).unwrap();

    let outcome = SynthesisPipeline::with_config(config.clone())
        .run(&program, Some(&profile))
        .unwrap();
    let run = RunReport::from_outcome("prog.dump", Some("trace.txt"), &outcome);
    let report = SynthesisReport::new(config, vec![run]);

    let path = dir.path().join("dynamic.json");
    report.save_json(&path).unwrap();
    let loaded = SynthesisReport::load_json(&path).unwrap();

    let metadata = &loaded.runs[0].metadata;
    assert!(metadata.dynamic);
    assert_eq!(metadata.trace.as_deref(), Some("trace.txt"));
    assert_eq!(metadata.baseline, 32.0);
    assert_eq!(loaded.runs[0].widths[0].entries[0].score, 16.0);
}

#[test]
fn test_load_corrupt_report() {
    let dir = tempdir().unwrap();
    let path = write_file(dir.path(), "broken.json", "{ not json");
    assert!(SynthesisReport::load_any(&path).is_err());
}
