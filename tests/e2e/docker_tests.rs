//! End-to-end tests against a real container runtime.
//!
//! These run the registered language profiles for real, so they need a
//! Docker daemon and the profile images pulled; they are ignored by
//! default and meant for the deployment host.

use crucible_server::SessionMode;

use crate::common::{is_status, TestEnv};

#[tokio::test]
#[ignore = "requires a Docker daemon with the profile images available"]
async fn python_hello_world() {
    let env = TestEnv::with_docker();
    let events = env
        .run_session(
            SessionMode::SingleShot,
            &[r#"{"filename": "hello.py", "language": "python", "content": "print(\"hi\")"}"#],
        )
        .await;

    let outputs: Vec<_> = events.iter().filter(|e| e["type"] == "output").collect();
    assert_eq!(outputs.len(), 1, "events: {events:?}");
    assert_eq!(outputs[0]["data"], "hi");
    assert!(is_status(events.last().unwrap(), |code| code == 0));
    assert_eq!(env.scratch_entries(), 0);
}

#[tokio::test]
#[ignore = "requires a Docker daemon with the profile images available"]
async fn c_compile_failure_streams_diagnostics() {
    let env = TestEnv::with_docker();
    let events = env
        .run_session(
            SessionMode::SingleShot,
            &["broken.c,c", "int main( {", "EOF"],
        )
        .await;

    assert!(
        events
            .iter()
            .any(|e| e["type"] == "error"
                && e["data"].as_str().unwrap_or_default().contains("error")),
        "expected compiler diagnostics: {events:?}"
    );
    assert!(is_status(events.last().unwrap(), |code| code != 0));
    assert_eq!(env.scratch_entries(), 0);
}

#[tokio::test]
#[ignore = "requires a Docker daemon with the profile images available"]
async fn raw_command_round_trip() {
    let env = TestEnv::with_docker();
    let events = env
        .run_session(
            SessionMode::Interactive,
            &[r#"{"type": "command", "command": "echo ok"}"#],
        )
        .await;

    assert_eq!(events[0]["type"], "output");
    assert_eq!(events[0]["data"], "ok");
    assert!(is_status(&events[1], |code| code == 0));
    assert_eq!(env.scratch_entries(), 0);
}
