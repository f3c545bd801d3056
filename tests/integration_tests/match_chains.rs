//! Integration tests for `tracechain match`.

use serde_json::{Value, json};

use crate::common::{REQUEST_LOG, TestTrace, json_output};

/// Chain records: `(name, ph, ts)` of every record on `pid`
fn chain_records(json: &Value, pid: u64) -> Vec<(String, String, f64)> {
    json["traceEvents"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["pid"] == pid && e["ph"] != "M")
        .map(|e| {
            (
                e["name"].as_str().unwrap().to_string(),
                e["ph"].as_str().unwrap().to_string(),
                e["ts"].as_f64().unwrap(),
            )
        })
        .collect()
}

#[test]
fn test_match_wildcard_pattern() {
    let test = TestTrace::new(REQUEST_LOG);
    let json = json_output(&test.run(&[
        "match",
        "-p",
        "receive_request_msg+*process_request_msg-",
        "-l",
        "request",
    ]));

    let events = json["traceEvents"].as_array().unwrap();
    assert_eq!(events.len(), 8 + 2);
    assert_eq!(
        events[8],
        json!({"name": "request", "ts": 1000.0, "pid": 1000, "tid": 0, "args": {}, "ph": "B"})
    );
    assert_eq!(events[9]["ph"], "E");
    assert_eq!(events[9]["ts"], 3000.0);
}

#[test]
fn test_match_without_hits_exports_trace_only() {
    let test = TestTrace::new(REQUEST_LOG);
    let json = json_output(&test.run(&["match", "-p", "missing+*missing-", "-l", "none"]));
    assert_eq!(json["traceEvents"].as_array().unwrap().len(), 8);
}

#[test]
fn test_match_chain_pid_option() {
    let test = TestTrace::new(REQUEST_LOG);
    let json = json_output(&test.run(&[
        "match",
        "-p",
        "serialize+serialize-",
        "-l",
        "encode",
        "--chain-pid",
        "77",
    ]));
    assert_eq!(
        chain_records(&json, 77),
        [
            ("encode".to_string(), "B".to_string(), 5000.0),
            ("encode".to_string(), "E".to_string(), 6000.0),
        ]
    );
}

#[test]
fn test_match_chain_pid_collision_fails() {
    let test = TestTrace::new(REQUEST_LOG);
    let output = test.run(&[
        "match",
        "-p",
        "serialize+serialize-",
        "-l",
        "encode",
        "--chain-pid",
        "1",
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("chain pid 1"), "{stderr}");
}

#[test]
fn test_match_invalid_pattern_fails() {
    let test = TestTrace::new(REQUEST_LOG);
    let output = test.run(&["match", "-p", "receive_request_msg+*", "-l", "bad"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid pattern"), "{stderr}");
    assert!(stderr.contains("wildcard"), "{stderr}");
}

#[test]
fn test_match_repeat_rule_and_unrestricted() {
    let log = "\
[trace] ts=1 ph=B name=a
[trace] ts=2 ph=B name=b
[trace] ts=3 ph=B name=b
[trace] ts=4 ph=E name=a
";
    let test = TestTrace::new(log);

    let json = json_output(&test.run(&["match", "-p", "a+*a-", "-l", "outer"]));
    assert!(chain_records(&json, 1000).is_empty());

    let json = json_output(&test.run(&["match", "-p", "a+*a-", "-l", "outer", "--unrestricted"]));
    assert_eq!(chain_records(&json, 1000).len(), 2);
}

#[test]
fn test_match_unrestricted_from_config() {
    let log = "\
[trace] ts=1 ph=B name=a
[trace] ts=2 ph=B name=b
[trace] ts=3 ph=B name=b
[trace] ts=4 ph=E name=a
";
    let test = TestTrace::new(log);
    test.write_config(
        r#"
[[chains]]
label = "outer"
pattern = "a+*a-"
"#,
    );
    let json = json_output(&test.run(&["match"]));
    assert!(chain_records(&json, 1000).is_empty());

    test.write_config(
        r#"
wildcard = "unrestricted"

[[chains]]
label = "outer"
pattern = "a+*a-"
"#,
    );
    let json = json_output(&test.run(&["match"]));
    assert_eq!(
        chain_records(&json, 1000),
        [
            ("outer".to_string(), "B".to_string(), 1000.0),
            ("outer".to_string(), "E".to_string(), 4000.0),
        ]
    );
}

#[test]
fn test_match_follows_flow_across_processes() {
    let log = r#"
[trace] ts=1 pid=1 ph=B name=send
[trace] ts=1 pid=1 ph=s name=msg id=3
[trace] ts=2 pid=1 ph=E name=send
[trace] ts=2.5 pid=2 ph=f name=msg id=3
[trace] ts=3 pid=2 ph=B name=recv
[trace] ts=4 pid=2 ph=E name=recv
"#;
    let test = TestTrace::new(log);
    let json = json_output(&test.run(&["match", "-p", "send+*recv-", "-l", "roundtrip"]));

    let events = json["traceEvents"].as_array().unwrap();
    assert_eq!(events[1]["id"], 3);
    assert_eq!(
        chain_records(&json, 1000),
        [
            ("roundtrip".to_string(), "B".to_string(), 1000.0),
            ("roundtrip".to_string(), "E".to_string(), 4000.0),
        ]
    );
}

#[test]
fn test_match_uses_configured_chains() {
    let test = TestTrace::new(REQUEST_LOG);
    test.write_config(
        r#"
chain-pid = 500
chain-process-name = "Chains"

[[chains]]
label = "response"
pattern = "prepare_response_msg+*receive_request_msg-"

[process-names]
1 = "server"
"#,
    );

    let json = json_output(&test.run(&[
        "match",
        "-p",
        "receive_request_msg+*process_request_msg-",
        "-l",
        "request",
    ]));

    let names: Vec<String> = chain_records(&json, 500)
        .into_iter()
        .filter(|(_, ph, _)| ph == "B")
        .map(|(name, _, _)| name)
        .collect();
    assert_eq!(names, ["request", "response"]);

    let metadata: Vec<&Value> = json["traceEvents"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["ph"] == "M")
        .collect();
    assert_eq!(metadata.len(), 2);
    assert_eq!(metadata[0]["args"]["name"], "server");
    assert_eq!(metadata[1]["args"]["name"], "Chains");
    assert_eq!(metadata[1]["pid"], 500);
}
