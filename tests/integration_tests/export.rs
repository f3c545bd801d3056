//! Integration tests for `tracechain export`.

use serde_json::json;

use crate::common::{REQUEST_LOG, TestTrace, json_output};

#[test]
fn test_export_file() {
    let test = TestTrace::new(REQUEST_LOG);
    let json = json_output(&test.run(&["export"]));

    assert_eq!(json["displayTimeUnit"], "ms");
    let events = json["traceEvents"].as_array().unwrap();
    assert_eq!(events.len(), 8);

    assert_eq!(
        events[0],
        json!({"name": "receive_request_msg", "ts": 1000.0, "pid": 1, "tid": 1, "args": {}, "ph": "B"})
    );
    assert_eq!(events[1]["ph"], "I");
    assert_eq!(events[1]["args"], json!({"bytes": 512}));
    assert_eq!(events[7]["ts"], 8000.0);
}

#[test]
fn test_export_stdin() {
    let test = TestTrace::new(REQUEST_LOG);
    let from_stdin = json_output(&test.run_stdin(&["export"]));
    let from_dash = json_output(&test.run_stdin(&["export", "-"]));
    let from_file = json_output(&test.run(&["export"]));

    assert_eq!(from_stdin, from_file);
    assert_eq!(from_dash, from_file);
}

#[test]
fn test_export_sorts_out_of_order_lines() {
    let test = TestTrace::new(
        "[trace] ts=5 ph=E name=work\n[trace] ts=1 ph=B name=work\n[trace] ts=5 ph=I name=after\n",
    );
    let json = json_output(&test.run(&["export"]));
    let events = json["traceEvents"].as_array().unwrap();

    let order: Vec<(&str, &str)> = events
        .iter()
        .map(|e| (e["name"].as_str().unwrap(), e["ph"].as_str().unwrap()))
        .collect();
    assert_eq!(order, [("work", "B"), ("work", "E"), ("after", "I")]);
}

#[test]
fn test_export_to_output_file() {
    let test = TestTrace::new(REQUEST_LOG);
    let out = test.root().join("out.json");
    let output = test.run(&["export", "--output", out.to_str().unwrap()]);

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["traceEvents"].as_array().unwrap().len(), 8);
}

#[test]
fn test_export_empty_input() {
    let test = TestTrace::new("");
    let json = json_output(&test.run(&["export"]));
    assert_eq!(json, json!({"traceEvents": [], "displayTimeUnit": "ms"}));
}

#[test]
fn test_export_malformed_line_fails() {
    let test = TestTrace::new("[trace] ts=1 ph=B name=a\n[trace] ts=oops ph=E name=a\n");
    let output = test.run(&["export"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2"), "{stderr}");
    assert!(stderr.contains("timestamp"), "{stderr}");
}

#[test]
fn test_export_missing_file_fails() {
    let test = TestTrace::new("");
    let output = test
        .command()
        .args(["export", "/nonexistent/path/to/file.log"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read"), "{stderr}");
}
