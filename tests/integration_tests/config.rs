//! Integration tests for config file and environment handling.

use crate::common::{REQUEST_LOG, TestTrace, json_output};

const CHAINS_CONFIG: &str = r#"
[[chains]]
label = "encode"
pattern = "serialize+serialize-"
"#;

fn chain_pids(json: &serde_json::Value) -> Vec<u64> {
    json["traceEvents"].as_array().unwrap()[8..]
        .iter()
        .map(|e| e["pid"].as_u64().unwrap())
        .collect()
}

#[test]
fn test_config_from_env_path() {
    let test = TestTrace::new(REQUEST_LOG);
    test.write_config(CHAINS_CONFIG);

    let json = json_output(&test.run(&["match"]));
    assert_eq!(chain_pids(&json), [1000, 1000]);
}

#[test]
fn test_explicit_config_flag() {
    let test = TestTrace::new(REQUEST_LOG);
    let other = test.root().join("other.toml");
    std::fs::write(&other, format!("chain-pid = 9\n{CHAINS_CONFIG}")).unwrap();

    let json = json_output(&test.run(&["match", "--config", other.to_str().unwrap()]));
    assert_eq!(chain_pids(&json), [9, 9]);
}

#[test]
fn test_env_overrides_file() {
    let test = TestTrace::new(REQUEST_LOG);
    test.write_config(&format!("chain-pid = 9\n{CHAINS_CONFIG}"));

    let output = test
        .command()
        .env("TRACECHAIN_CHAIN_PID", "42")
        .arg("match")
        .arg(test.trace_path())
        .output()
        .unwrap();
    assert_eq!(chain_pids(&json_output(&output)), [42, 42]);
}

#[test]
fn test_cli_chain_pid_overrides_config() {
    let test = TestTrace::new(REQUEST_LOG);
    test.write_config(&format!("chain-pid = 9\n{CHAINS_CONFIG}"));

    let json = json_output(&test.run(&["match", "--chain-pid", "11"]));
    assert_eq!(chain_pids(&json), [11, 11]);
}

#[test]
fn test_invalid_config_pattern_fails() {
    let test = TestTrace::new(REQUEST_LOG);
    test.write_config("[[chains]]\nlabel = \"bad\"\npattern = \"**\"\n");

    let output = test.run(&["export"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load config"), "{stderr}");
}

#[test]
fn test_missing_explicit_config_fails() {
    let test = TestTrace::new(REQUEST_LOG);
    let output = test.run(&["export", "--config", "/nonexistent/tracechain.toml"]);
    assert!(!output.status.success());
}

#[test]
fn test_verbose_logs_to_stderr() {
    let test = TestTrace::new(REQUEST_LOG);
    let output = test.run(&["-v", "match", "-p", "send+send-", "-l", "x"]);

    let json = json_output(&output);
    assert!(json["traceEvents"].is_array());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[debug]"), "{stderr}");
    assert!(stderr.contains("Parsed 8 trace events"), "{stderr}");
}
