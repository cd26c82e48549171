//! End-to-end tests for the handshake probe.
//!
//! Each test writes a small `sh` script standing in for a tool server and
//! runs it with `sh` as the runner.

use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use relay_mcp::{McpError, ProbeConfig, ProbeOutcome, ProbeResponse, run_probe};
use tempfile::NamedTempFile;

fn script(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{body}").unwrap();
    file.flush().unwrap();
    file
}

fn sh_config(server: PathBuf, timeout: Duration) -> ProbeConfig {
    ProbeConfig {
        server,
        runner: "sh".to_string(),
        runner_args: vec![],
        timeout,
    }
}

#[tokio::test]
async fn responsive_server_reports_valid_object() {
    let server = script(
        r#"read line
echo '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","capabilities":{},"serverInfo":{"name":"fake","version":"0.1"}}}'"#,
    );
    let config = sh_config(server.path().to_path_buf(), Duration::from_secs(10));

    let outcome = run_probe(&config).await.unwrap();
    assert!(outcome.is_success(), "unexpected outcome: {outcome:?}");
    match outcome {
        ProbeOutcome::Exited {
            status, response, ..
        } => {
            assert!(status.success());
            let ProbeResponse::Valid(value) = response else {
                panic!("expected a valid response");
            };
            assert_eq!(value["id"], 1);
            assert_eq!(value["result"]["serverInfo"]["name"], "fake");
        }
        other => panic!("expected Exited, got {other:?}"),
    }
}

#[tokio::test]
async fn server_receives_initialize_request() {
    // Answers differently depending on what arrived on stdin.
    let server = script(
        r#"read line
case "$line" in
  *'"method":"initialize"'*'"protocolVersion":"2024-11-05"'*) echo '{"saw":"initialize"}' ;;
  *) echo '{"saw":"something else"}' ;;
esac"#,
    );
    let config = sh_config(server.path().to_path_buf(), Duration::from_secs(10));

    match run_probe(&config).await.unwrap() {
        ProbeOutcome::Exited {
            response: ProbeResponse::Valid(value),
            ..
        } => assert_eq!(value["saw"], "initialize"),
        other => panic!("expected a valid response, got {other:?}"),
    }
}

#[tokio::test]
async fn silent_server_times_out_and_is_killed() {
    let server = script("exec sleep 30");
    let config = sh_config(server.path().to_path_buf(), Duration::from_millis(300));

    let started = Instant::now();
    let outcome = run_probe(&config).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));

    match outcome {
        ProbeOutcome::TimedOut { pid } => {
            let pid = pid.expect("spawned child has a pid");
            #[cfg(target_os = "linux")]
            assert!(
                !std::path::Path::new(&format!("/proc/{pid}")).exists(),
                "child {pid} is still running"
            );
            let _ = pid;
        }
        other => panic!("expected TimedOut, got {other:?}"),
    }
}

#[tokio::test]
async fn output_held_open_by_background_process_times_out() {
    // The server exits at once but a background child keeps stdout open.
    let server = script(
        r#"read line
sleep 8 &
exit 0"#,
    );
    let config = sh_config(server.path().to_path_buf(), Duration::from_secs(1));

    let started = Instant::now();
    let outcome = run_probe(&config).await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_secs(3), "took {elapsed:?}");
    assert!(
        matches!(outcome, ProbeOutcome::TimedOut { pid: Some(_) }),
        "expected TimedOut, got {outcome:?}"
    );
}

#[tokio::test]
async fn non_json_output_is_reported_invalid() {
    let server = script(
        r#"read line
echo 'Traceback (most recent call last):'
echo 'oops' >&2
exit 1"#,
    );
    let config = sh_config(server.path().to_path_buf(), Duration::from_secs(10));

    match run_probe(&config).await.unwrap() {
        ProbeOutcome::Exited {
            status,
            stderr,
            response,
            ..
        } => {
            assert_eq!(status.code(), Some(1));
            assert_eq!(stderr.trim(), "oops");
            assert!(matches!(response, ProbeResponse::Invalid(_)));
        }
        other => panic!("expected Exited, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_entry_point_is_not_found() {
    let config = sh_config(
        PathBuf::from("/definitely/not/here/server.py"),
        Duration::from_secs(1),
    );

    match run_probe(&config).await.unwrap() {
        ProbeOutcome::NotFound { what } => assert!(what.contains("server.py")),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_runner_is_not_found() {
    let server = script("exit 0");
    let config = ProbeConfig {
        runner: "no_such_runner_xyz123".to_string(),
        ..sh_config(server.path().to_path_buf(), Duration::from_secs(1))
    };

    let outcome: Result<ProbeOutcome, McpError> = run_probe(&config).await;
    match outcome.unwrap() {
        ProbeOutcome::NotFound { what } => assert!(what.contains("no_such_runner_xyz123")),
        other => panic!("expected NotFound, got {other:?}"),
    }
}
