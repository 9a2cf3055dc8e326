//! Integration tests for the mutador binary.

use std::fs;
use std::io::Write;

use predicates::prelude::*;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn test_cli_help() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mutador");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("--mmu"));
}

#[test]
fn test_summary_is_the_default_analysis() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mutador");
    cmd.arg(fixture("go15.trace"))
        .assert()
        .success()
        .stdout(predicate::str::contains("STW: max="))
        .stdout(predicate::str::contains("Mean mutator utilization:"));
}

#[test]
fn test_summary_from_stdin() {
    let trace = fs::read_to_string(fixture("go15.trace")).unwrap();
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mutador");
    cmd.write_stdin(trace)
        .assert()
        .success()
        .stdout(predicate::str::contains("STW: max="));
}

#[test]
fn test_legacy_timed_trace_has_utilization() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mutador");
    cmd.arg(fixture("go14.trace"))
        .assert()
        .success()
        .stdout(predicate::str::contains("STW: max="))
        .stdout(predicate::str::contains("Mean mutator utilization:"));
}

#[test]
fn test_untimed_trace_omits_utilization() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mutador");
    cmd.arg(fixture("go14_untimed.trace"))
        .assert()
        .success()
        .stdout(predicate::str::contains("STW: max="))
        .stdout(predicate::str::contains("Mean mutator utilization").not());
}

#[test]
fn test_no_gc_recorded() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mutador");
    cmd.write_stdin("not a trace\nstill not a trace\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no GC recorded"));
}

#[test]
fn test_missing_input_file() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mutador");
    cmd.arg("/definitely/not/here.trace")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open"));
}

#[test]
fn test_mmu_table() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mutador");
    let output = cmd.arg("--mmu").arg(fixture("go15.trace")).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "granularity\tMMU");
    // Header plus one row per sample point.
    assert_eq!(lines.len(), 501);
    for line in &lines[1..] {
        let cols: Vec<&str> = line.split('\t').collect();
        assert_eq!(cols.len(), 2);
        let mmu: f64 = cols[1].parse().unwrap();
        assert!((0.0..=1.0).contains(&mmu));
    }
}

#[test]
fn test_mmu_requires_prog_times() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mutador");
    cmd.arg("--mmu")
        .arg(fixture("go14_untimed.trace"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("program execution times"));
}

#[test]
fn test_mucdf_table() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mutador");
    let output = cmd
        .arg("--mucdf")
        .arg("50")
        .arg(fixture("go15.trace"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "utilization\tcdf");
    let last: Vec<&str> = lines.last().unwrap().split('\t').collect();
    // CDF reaches 1 at full utilization.
    assert_eq!(last[0], "1");
    assert!((last[1].parse::<f64>().unwrap() - 1.0).abs() < 1e-9);
}

#[test]
fn test_mut_topology_table() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mutador");
    let output = cmd.arg("--mut").arg(fixture("go15.trace")).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let header: Vec<&str> = stdout.lines().next().unwrap().split('\t').collect();
    assert_eq!(
        header,
        vec!["granularity", "100%ile", "99.9%ile", "99%ile", "90%ile"]
    );
}

#[test]
fn test_mudmap_matrix() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mutador");
    let output = cmd.arg("--mudmap").arg(fixture("go15.trace")).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    // Header row: column count then the window sizes.
    assert!(lines[0].starts_with("101 "));
    assert_eq!(lines.len(), 101);
}

#[test]
fn test_json_summary() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mutador");
    let output = cmd
        .arg("--format")
        .arg("json")
        .arg(fixture("go15.trace"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["format"], "mutador-json-v1");
    assert_eq!(value["summary"]["cycles"], 4);
    assert!(value["summary"]["mean_mutator_utilization"].is_number());
}

#[test]
fn test_json_mmu_curve() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mutador");
    let output = cmd
        .arg("--mmu")
        .arg("--format")
        .arg("json")
        .arg(fixture("go15.trace"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let curves = &value["curves"];
    assert_eq!(curves["series"][0]["label"], "MMU");
    assert_eq!(curves["xs"].as_array().unwrap().len(), 500);
}

#[test]
fn test_trace_goes_backward_is_fatal() {
    let trace = "gc #1 @0.100s 2%: 1+1+1+1+1 ms clock, 1+1+1+1+1 ms cpu, 4->5->3 MB, 5 MB goal, 4 P\n\
                 gc #2 @0.050s 2%: 1+1+1+1+1 ms clock, 1+1+1+1+1 ms cpu, 5->6->3 MB, 6 MB goal, 4 P\n";
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mutador");
    cmd.write_stdin(trace)
        .assert()
        .failure()
        .stderr(predicate::str::contains("trace goes backward"));
}

#[test]
fn test_reads_tempfile_path() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("run.trace");
    let mut file = fs::File::create(&path).unwrap();
    writeln!(
        file,
        "gc #1 @0.104s 2%: 0.5+1.2+0.1+8.0+1.1 ms clock, \
         2.0+1.2+0/0.1/0.2+16/8/0+4.4 ms cpu, 4->5->3 MB, 5 MB goal, 4 P"
    )
    .unwrap();
    writeln!(
        file,
        "gc #2 @0.207s 3%: 0.4+1.0+0.1+9.5+0.9 ms clock, \
         1.6+1.0+0/0.1/0.1+19/9.5/0+3.6 ms cpu, 5->6->3 MB, 6 MB goal, 4 P"
    )
    .unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("mutador");
    cmd.arg(path)
        .assert()
        .success()
        .stdout(predicate::str::contains("STW: max="));
}
