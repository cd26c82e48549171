//! Handshake probe: checks that a tool server answers a single `initialize`.
//!
//! Unlike [`McpClient`](crate::McpClient), the probe does not keep a session.
//! It writes one request, closes the server's stdin and inspects whatever the
//! process printed before exiting.

use crate::error::McpError;
use crate::jsonrpc::{ClientInfo, JsonRpcRequest};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// Default time the server gets to answer and exit.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// What to launch and how long to wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Path of the server entry point, appended after the runner arguments.
    pub server: PathBuf,
    /// Executable that runs the entry point.
    pub runner: String,
    pub runner_args: Vec<String>,
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            server: PathBuf::from("server.py"),
            runner: "uv".to_string(),
            runner_args: vec!["run".to_string(), "python".to_string()],
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

/// How the server's stdout looked.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeResponse {
    /// Stdout was a single JSON object.
    Valid(serde_json::Value),
    /// Stdout was non-empty but not a JSON object.
    Invalid(String),
    /// Nothing was printed.
    Empty,
}

/// Result of one probe run.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// The server exited within the timeout.
    Exited {
        status: ExitStatus,
        stdout: String,
        stderr: String,
        response: ProbeResponse,
    },
    /// The server was still running at the deadline and has been killed.
    TimedOut { pid: Option<u32> },
    /// The entry point or the runner executable does not exist.
    NotFound { what: String },
}

impl ProbeOutcome {
    /// True only when the server answered with a well-formed object.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ProbeOutcome::Exited {
                response: ProbeResponse::Valid(_),
                ..
            }
        )
    }
}

/// The request the probe sends, exactly as written to the server.
pub fn initialize_request_line() -> Result<String, McpError> {
    let request = JsonRpcRequest::initialize(1, ClientInfo::new("test-client", "1.0.0"));
    let mut line = serde_json::to_string(&request)?;
    line.push('\n');
    Ok(line)
}

/// Classify the server's standard output.
pub fn parse_response(stdout: &str) -> ProbeResponse {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return ProbeResponse::Empty;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value @ serde_json::Value::Object(_)) => ProbeResponse::Valid(value),
        Ok(other) => ProbeResponse::Invalid(format!("expected a JSON object, got: {other}")),
        Err(e) => ProbeResponse::Invalid(e.to_string()),
    }
}

/// Spawn the server, send one `initialize` and wait for it to exit.
pub async fn run_probe(config: &ProbeConfig) -> Result<ProbeOutcome, McpError> {
    if !config.server.exists() {
        return Ok(ProbeOutcome::NotFound {
            what: format!("server entry point '{}'", config.server.display()),
        });
    }

    let mut cmd = Command::new(&config.runner);
    cmd.args(&config.runner_args)
        .arg(&config.server)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(ProbeOutcome::NotFound {
                what: format!("runner '{}'", config.runner),
            });
        }
        Err(e) => {
            return Err(McpError::Launch {
                command: config.runner.clone(),
                source: e,
            });
        }
    };
    let pid = child.id();
    tracing::debug!("Probe spawned {} (pid {pid:?})", config.runner);

    let mut stdout_task = child.stdout.take().map(read_to_string);
    let mut stderr_task = child.stderr.take().map(read_to_string);

    if let Some(mut stdin) = child.stdin.take() {
        let line = initialize_request_line()?;
        // A server that exits early closes the pipe; its output still gets reported.
        if let Err(e) = stdin.write_all(line.as_bytes()).await {
            tracing::warn!("Failed to write initialize request: {e}");
        }
        drop(stdin);
    }

    // The deadline also covers draining both pipes, which a leftover
    // background process can hold open after the server exits.
    let finished = tokio::time::timeout(config.timeout, async {
        let status = child.wait().await?;
        let stdout = collect(stdout_task.as_mut()).await;
        let stderr = collect(stderr_task.as_mut()).await;
        Ok::<_, std::io::Error>((status, stdout, stderr))
    })
    .await;

    let (status, stdout, stderr) = match finished {
        Ok(result) => result?,
        Err(_) => {
            tracing::debug!("Probe timed out after {:?}, killing pid {pid:?}", config.timeout);
            if let Err(e) = child.kill().await {
                tracing::debug!("Kill after timeout: {e}");
            }
            abort(stdout_task);
            abort(stderr_task);
            return Ok(ProbeOutcome::TimedOut { pid });
        }
    };
    let response = parse_response(&stdout);

    Ok(ProbeOutcome::Exited {
        status,
        stdout,
        stderr,
        response,
    })
}

fn read_to_string<R>(mut stream: R) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Err(e) = stream.read_to_end(&mut buf).await {
            tracing::warn!("Failed to read probe output: {e}");
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

async fn collect(task: Option<&mut JoinHandle<String>>) -> String {
    match task {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    }
}

fn abort(task: Option<JoinHandle<String>>) {
    if let Some(handle) = task {
        handle.abort();
    }
}
