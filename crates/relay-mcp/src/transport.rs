//! Stdio transport for MCP server communication.
//!
//! Spawns a child process and manages async communication over stdin/stdout
//! using newline-delimited JSON-RPC messages.

use crate::error::McpError;
use crate::jsonrpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use relay_types::truncate_for_display;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>;

/// How long `shutdown` waits for the child to exit after stdin is closed.
const GRACEFUL_EXIT: Duration = Duration::from_secs(5);

/// Async stdio transport for communicating with an MCP server process.
pub struct StdioTransport {
    next_id: AtomicU64,
    write_tx: mpsc::Sender<String>,
    pending: PendingMap,
    closed: Arc<AtomicBool>,
    reader_handle: JoinHandle<()>,
    writer_handle: JoinHandle<()>,
    child: Mutex<Child>,
    timeout: Option<Duration>,
}

impl StdioTransport {
    /// Spawn a child process and start background reader/writer tasks.
    ///
    /// `timeout` bounds each request; `None` waits indefinitely.
    pub fn spawn(
        command: &str,
        args: &[String],
        env: &HashMap<String, String>,
        timeout: Option<Duration>,
    ) -> Result<Self, McpError> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                McpError::NotFound {
                    what: format!("command '{command}'"),
                }
            } else {
                McpError::Launch {
                    command: command.to_string(),
                    source: e,
                }
            }
        })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(McpError::Io(std::io::Error::other(
                "child process stdio was not piped",
            )));
        };

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));

        // Writer task: drains channel and writes to child stdin
        let (write_tx, mut write_rx) = mpsc::channel::<String>(64);
        let writer_handle = tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(msg) = write_rx.recv().await {
                if stdin.write_all(msg.as_bytes()).await.is_err()
                    || stdin.write_all(b"\n").await.is_err()
                    || stdin.flush().await.is_err()
                {
                    tracing::debug!("MCP server stdin closed");
                    break;
                }
            }
        });

        // Reader task: reads lines from stdout, parses JSON-RPC, dispatches
        let pending_for_reader = Arc::clone(&pending);
        let closed_for_reader = Arc::clone(&closed);
        let reader_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                let resp: JsonRpcResponse = match serde_json::from_str(&line) {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!(
                            "Skipping non JSON-RPC line from MCP server: {e}: {}",
                            truncate_for_display(&line, 200)
                        );
                        continue;
                    }
                };
                if let Some(method) = &resp.method {
                    tracing::debug!("Ignoring request '{method}' from MCP server");
                    continue;
                }
                match resp.id {
                    Some(id) => {
                        if let Some(tx) = pending_for_reader.lock().await.remove(&id) {
                            let _ = tx.send(resp);
                        }
                    }
                    None => tracing::debug!("Ignoring MCP server notification: {line}"),
                }
            }
            // Server closed its output: fail everything still waiting.
            closed_for_reader.store(true, Ordering::SeqCst);
            pending_for_reader.lock().await.clear();
        });

        Ok(Self {
            next_id: AtomicU64::new(1),
            write_tx,
            pending,
            closed,
            reader_handle,
            writer_handle,
            child: Mutex::new(child),
            timeout,
        })
    }

    /// Send a JSON-RPC request and wait for the response.
    pub async fn send_request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<JsonRpcResponse, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let serialized = serde_json::to_string(&JsonRpcRequest::new(id, method, params))?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        if self.closed.load(Ordering::SeqCst) {
            self.pending.lock().await.remove(&id);
            return Err(McpError::ServerClosed {
                method: method.to_string(),
            });
        }

        tracing::debug!("MCP request #{id}: {method}");
        self.write_tx
            .send(serialized)
            .await
            .map_err(|_| McpError::ServerClosed {
                method: method.to_string(),
            })?;

        let response = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(response) => response,
                Err(_) => {
                    self.pending.lock().await.remove(&id);
                    return Err(McpError::Timeout {
                        method: method.to_string(),
                        timeout_ms: limit.as_millis() as u64,
                    });
                }
            },
            None => rx.await,
        };

        response.map_err(|_| McpError::ServerClosed {
            method: method.to_string(),
        })
    }

    /// Send a JSON-RPC notification (fire-and-forget, no response expected).
    pub async fn send_notification(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<(), McpError> {
        let serialized = serde_json::to_string(&JsonRpcNotification::new(method, params))?;

        self.write_tx
            .send(serialized)
            .await
            .map_err(|_| McpError::ServerClosed {
                method: method.to_string(),
            })
    }

    /// Shut down the transport: close stdin, wait briefly, then kill.
    pub async fn shutdown(self) {
        self.shutdown_within(GRACEFUL_EXIT).await;
    }

    /// Close stdin and give the child `grace` to exit before killing it.
    pub(crate) async fn shutdown_within(self, grace: Duration) {
        let Self {
            write_tx,
            reader_handle,
            writer_handle,
            child,
            ..
        } = self;
        let mut child = child.into_inner();

        // The writer task owns the child's stdin; ending it sends EOF.
        drop(write_tx);
        writer_handle.abort();
        let _ = writer_handle.await;

        match tokio::time::timeout(grace, child.wait()).await {
            Ok(status) => tracing::debug!("MCP server exited: {status:?}"),
            Err(_) => {
                tracing::debug!("MCP server did not exit within {grace:?}, killing it");
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to kill MCP server: {e}");
                }
            }
        }

        reader_handle.abort();
    }
}
