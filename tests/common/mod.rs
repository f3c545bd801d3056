//! # Test Utilities for tracechain
//!
//! `TestTrace` writes a trace log (and optionally a config file) into a temporary
//! directory and runs the `tracechain` binary against it.
//!
//! ## Environment Isolation
//!
//! Commands run with `TRACECHAIN_CONFIG_PATH` pointing into the temp dir and every
//! other `TRACECHAIN_*` variable removed, so a user config never leaks into tests.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

pub struct TestTrace {
    temp_dir: TempDir, // Must keep to ensure cleanup on drop
    trace_path: PathBuf,
}

impl TestTrace {
    /// Write `log` as `trace.log` in a fresh temp dir
    pub fn new(log: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let trace_path = temp_dir.path().join("trace.log");
        std::fs::write(&trace_path, log).expect("Failed to write trace log");
        Self {
            temp_dir,
            trace_path,
        }
    }

    pub fn trace_path(&self) -> &Path {
        &self.trace_path
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("config.toml")
    }

    /// Write the config file picked up through `TRACECHAIN_CONFIG_PATH`
    pub fn write_config(&self, contents: &str) {
        std::fs::write(self.config_path(), contents).expect("Failed to write config");
    }

    /// A `tracechain` command with an isolated environment
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_tracechain"));
        for (key, _) in std::env::vars() {
            if key.starts_with("TRACECHAIN_") {
                cmd.env_remove(key);
            }
        }
        cmd.env("TRACECHAIN_CONFIG_PATH", self.config_path())
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .current_dir(self.root());
        cmd
    }

    /// Run with `args` followed by the trace file path
    pub fn run(&self, args: &[&str]) -> Output {
        self.command()
            .args(args)
            .arg(self.trace_path())
            .output()
            .expect("Failed to run tracechain")
    }

    /// Run with `args`, feeding the trace through stdin
    pub fn run_stdin(&self, args: &[&str]) -> Output {
        let log = std::fs::read(self.trace_path()).expect("Failed to read trace log");
        let mut child = self
            .command()
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to spawn tracechain");
        child
            .stdin
            .take()
            .unwrap()
            .write_all(&log)
            .expect("Failed to write to stdin");
        child.wait_with_output().expect("Failed to read output")
    }
}

/// Parse stdout as JSON, asserting the run succeeded
pub fn json_output(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "tracechain failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("Should output valid JSON")
}

/// The request/response trace used across tests: one request, one response, 1 ms apart.
pub const REQUEST_LOG: &str = r#"startup noise that is not a trace line
[trace] ts=1 pid=1 tid=1 ph=B name="receive_request_msg"
[trace] ts=2 pid=1 tid=1 ph=I name="parse" arg.bytes=512
[trace] ts=3 pid=1 tid=1 ph=E name="process_request_msg"
[trace] ts=4 pid=1 tid=1 ph=B name="prepare_response_msg"
[trace] ts=5 pid=1 tid=1 ph=B name="serialize"
[trace] ts=6 pid=1 tid=1 ph=E name="serialize"
[trace] ts=7 pid=1 tid=1 ph=B name="send"
[trace] ts=8 pid=1 tid=1 ph=E name="receive_request_msg"
"#;
