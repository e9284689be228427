//! On-disk round trips: transcode a file, re-read the dump, compare.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use vcdx_conformance::{make_config, CLK_VCD, COUNTER_VCD};
use vcdx_transcode::{
    digest_file, open_vcd, transcode, verify_roundtrip, TranscodeOptions, TranscodeReport,
    WaveformSource,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_fixture(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

/// Transcodes `input` into `input.out` and returns the run report.
fn dump_file(input: &Path, options: TranscodeOptions) -> (TranscodeReport, PathBuf) {
    let output = input.with_extension("vcd.out");
    let sink = BufWriter::new(File::create(&output).unwrap());
    let mut source = open_vcd(input).unwrap();
    let (outcome, _) = transcode(&mut source, Some(sink), options).unwrap();
    (outcome.report, output)
}

// ---------------------------------------------------------------------------
// Echo fidelity
// ---------------------------------------------------------------------------

#[test]
fn clock_dump_verifies() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "clk.vcd", CLK_VCD);
    let (report, output) = dump_file(&input, TranscodeOptions::default());
    let roundtrip = verify_roundtrip(report.digest, &output).unwrap();
    assert!(roundtrip.matches());
    assert_eq!(roundtrip.batches, 2);
}

#[test]
fn counter_dump_verifies() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "counter.vcd", COUNTER_VCD);
    let (report, output) = dump_file(&input, TranscodeOptions::default());
    assert!(verify_roundtrip(report.digest, &output).unwrap().matches());
    assert_eq!(digest_file(&input).unwrap().finish(), report.digest);
}

#[test]
fn tampered_dump_fails_verification() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "counter.vcd", COUNTER_VCD);
    let (report, output) = dump_file(&input, TranscodeOptions::default());
    let text = fs::read_to_string(&output).unwrap();
    fs::write(&output, text.replace("b0001 #", "b0011 #")).unwrap();
    let roundtrip = verify_roundtrip(report.digest, &output).unwrap();
    assert!(!roundtrip.matches());
    assert_ne!(roundtrip.expected, roundtrip.actual);
}

#[test]
fn dump_of_dump_is_stable() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "counter.vcd", COUNTER_VCD);
    let (_, first) = dump_file(&input, TranscodeOptions::default());
    let second_input = write_fixture(dir.path(), "again.vcd", &fs::read_to_string(&first).unwrap());
    let (_, second) = dump_file(&second_input, TranscodeOptions::default());
    let a = fs::read_to_string(&first).unwrap();
    let b = fs::read_to_string(&second).unwrap();
    // without closers the re-read nests sibling scopes, so only the data
    // sections are compared
    assert_eq!(
        a.split_once("$enddefinitions $end\n\n").unwrap().1,
        b.split_once("$enddefinitions $end\n\n").unwrap().1
    );
}

#[test]
fn upscope_dump_reproduces_tree() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "counter.vcd", COUNTER_VCD);
    let config = make_config("[output]\nemit_upscope = true\n");
    let (_, output) = dump_file(&input, TranscodeOptions::from(&config));

    let mut original = open_vcd(&input).unwrap();
    original.read_header().unwrap();
    let mut reread = open_vcd(&output).unwrap();
    reread.read_header().unwrap();

    let mut a = Vec::new();
    original.scope_tree().walk(|path, scope| a.push((path.to_string(), scope.var_count())));
    let mut b = Vec::new();
    reread.scope_tree().walk(|path, scope| b.push((path.to_string(), scope.var_count())));
    assert_eq!(a, b);
    assert_eq!(reread.date(), original.date());
    assert_eq!(reread.timescale(), "1ps");
}

#[test]
fn sibling_roots_survive_with_upscope() {
    let text = "$scope module a $end\n$var wire 1 ! x $end\n$upscope $end\n\
                $scope module b $end\n$var wire 1 \" y $end\n$upscope $end\n\
                $enddefinitions $end\n#0\n1!\n0\"\n";
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "two.vcd", text);
    let options = TranscodeOptions {
        emit_upscope: true,
        ..Default::default()
    };
    let (_, output) = dump_file(&input, options);
    let mut reread = open_vcd(&output).unwrap();
    reread.read_header().unwrap();
    let names: Vec<&str> = reread.top_scopes().iter().map(|s| s.name()).collect();
    assert_eq!(names, ["a", "b"]);
}

#[test]
fn report_serializes_for_tools() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path(), "counter.vcd", COUNTER_VCD);
    let (report, _) = dump_file(&input, TranscodeOptions::default());
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["batches"], 5);
    assert_eq!(json["unrecognized"], 2);
    assert_eq!(json["aliased_symbols"], 1);
    assert_eq!(json["digest"].as_array().map(Vec::len), Some(16));
}
