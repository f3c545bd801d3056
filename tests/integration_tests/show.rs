//! Integration tests for `tracechain show`.

use crate::common::{REQUEST_LOG, TestTrace};

fn stdout(output: &std::process::Output) -> String {
    assert!(
        output.status.success(),
        "tracechain failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn test_show_events() {
    let test = TestTrace::new(REQUEST_LOG);
    let listing = stdout(&test.run(&["show"]));

    insta::assert_snapshot!(listing, @r"
    [1 ms]: receive_request_msg (B)
    [2 ms]: parse (I)
    [3 ms]: process_request_msg (E)
    [4 ms]: prepare_response_msg (B)
    [5 ms]: serialize (B)
    [6 ms]: serialize (E)
    [7 ms]: send (B)
    [8 ms]: receive_request_msg (E)
    ");
}

#[test]
fn test_show_chains() {
    let test = TestTrace::new(REQUEST_LOG);
    let listing = stdout(&test.run(&[
        "show",
        "-p",
        "prepare_response_msg+*receive_request_msg-",
        "-l",
        "response",
    ]));

    insta::assert_snapshot!(listing, @r"
    [4 - 8 ms] response (5 events)
        [4 ms] prepare_response_msg (B) 1/1
        [5 ms] serialize (B) 1/1
        [6 ms] serialize (E) 1/1
        [7 ms] send (B) 1/1
        [8 ms] receive_request_msg (E) 1/1
    ");
}
