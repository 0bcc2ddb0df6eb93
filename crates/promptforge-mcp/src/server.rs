//! Server lifecycle over a line-delimited channel
//!
//! `Stopped -> Starting -> Running -> Stopping -> Stopped`. Requests are
//! handled one at a time in arrival order. Cancellation is only observed
//! between requests, so `stop` lets an in-flight request finish and flush its
//! response before the channel is released.

use promptforge_persistence::Store;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::protocol::ServerInfo;
use crate::router::Router;
use crate::tools::ForgeTools;

/// Lifecycle state of the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerState {
    /// Not serving
    Stopped,
    /// Binding the channel
    Starting,
    /// Accepting requests
    Running,
    /// Draining the in-flight request
    Stopping,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServerState::Stopped => "stopped",
            ServerState::Starting => "starting",
            ServerState::Running => "running",
            ServerState::Stopping => "stopping",
        };
        f.write_str(s)
    }
}

/// Snapshot returned by `start`, `stop` and `status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerStatus {
    /// Current lifecycle state
    pub state: ServerState,
    /// Responses written since the server was created
    pub served_requests: u64,
    /// Names of the exposed tools
    pub available_tools: Vec<&'static str>,
}

struct Running {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Single-client protocol server
pub struct McpServer {
    router: Router,
    state: Arc<watch::Sender<ServerState>>,
    served: Arc<AtomicU64>,
    running: Mutex<Option<Running>>,
}

impl McpServer {
    /// Create a stopped server over `store`
    #[must_use]
    pub fn new(store: Arc<dyn Store>, info: ServerInfo) -> Self {
        let (state, _) = watch::channel(ServerState::Stopped);
        Self {
            router: Router::new(store, info),
            state: Arc::new(state),
            served: Arc::new(AtomicU64::new(0)),
            running: Mutex::new(None),
        }
    }

    /// Current status
    pub fn status(&self) -> ServerStatus {
        ServerStatus {
            state: *self.state.borrow(),
            served_requests: self.served.load(Ordering::SeqCst),
            available_tools: ForgeTools::descriptors().iter().map(|t| t.name).collect(),
        }
    }

    /// Start serving `reader`/`writer` on a background task
    ///
    /// Returns as soon as the task is spawned. A no-op returning the current
    /// status when the server is already running.
    pub async fn start<R, W>(&self, reader: R, writer: W) -> ServerStatus
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut running = self.running.lock().await;
        let current = *self.state.borrow();
        if matches!(current, ServerState::Running | ServerState::Starting) {
            return self.status();
        }

        // Reap a loop that already ended on EOF
        if let Some(previous) = running.take() {
            let _ = previous.task.await;
        }

        self.state.send_replace(ServerState::Starting);

        let cancel = CancellationToken::new();
        let state = Arc::clone(&self.state);
        state.send_replace(ServerState::Running);

        let task = tokio::spawn(serve_loop(
            self.router.clone(),
            reader,
            writer,
            cancel.clone(),
            state,
            Arc::clone(&self.served),
        ));
        *running = Some(Running { cancel, task });

        info!("MCP server started");
        self.status()
    }

    /// Stop serving and wait for the in-flight request to complete
    ///
    /// A no-op when already stopped.
    pub async fn stop(&self) -> ServerStatus {
        let mut running = self.running.lock().await;
        let Some(handle) = running.take() else {
            return self.status();
        };

        if *self.state.borrow() != ServerState::Stopped {
            self.state.send_replace(ServerState::Stopping);
        }
        handle.cancel.cancel();
        if let Err(e) = handle.task.await {
            error!("MCP server task failed: {}", e);
        }
        self.state.send_replace(ServerState::Stopped);

        info!("MCP server stopped");
        self.status()
    }

    /// Resolves once the server reaches `Stopped` (client hung up, or `stop`)
    pub async fn stopped(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|s| *s == ServerState::Stopped).await;
    }
}

async fn serve_loop<R, W>(
    router: Router,
    reader: R,
    mut writer: W,
    cancel: CancellationToken,
    state: Arc<watch::Sender<ServerState>>,
    served: Arc<AtomicU64>,
) where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let mut lines = LinesStream::new(BufReader::new(reader).lines());

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = lines.next() => next,
        };

        let line = match next {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                error!("Failed to read from channel: {}", e);
                break;
            }
            None => {
                info!("Client closed the channel");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        // Handled outside the select: a stop request cannot interrupt it
        let Some(response) = router.handle_line(&line).await else {
            continue;
        };

        let encoded = match serde_json::to_string(&response) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!("Failed to encode response: {}", e);
                continue;
            }
        };
        if let Err(e) = write_frame(&mut writer, &encoded).await {
            warn!("Failed to write response, closing channel: {}", e);
            break;
        }
        served.fetch_add(1, Ordering::SeqCst);
    }

    let _ = writer.flush().await;
    state.send_replace(ServerState::Stopped);
}

async fn write_frame<W>(writer: &mut W, frame: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
