// src/reload/server.rs

//! Server-sent-events endpoint for live reload.
//!
//! Each accepted connection is registered with the engine's
//! [`LiveReloadHub`](super::LiveReloadHub) through
//! [`EngineEvent::ClientConnected`]; the hub itself is only ever touched from
//! the engine loop. The connection task then writes one `data: <path>` frame
//! per notification until the client goes away.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::EngineEvent;

const SSE_HEADERS: &str = "HTTP/1.1 200 OK\r\n\
Content-Type: text/event-stream\r\n\
Cache-Control: no-cache\r\n\
Connection: keep-alive\r\n\
Access-Control-Allow-Origin: *\r\n\r\n";

const NOT_FOUND: &str = "HTTP/1.1 404 Not Found\r\n\
Content-Length: 0\r\n\
Connection: close\r\n\r\n";

/// Encode one notification as an event-stream frame.
pub fn sse_frame(path: &str) -> String {
    format!("data: {path}\n\n")
}

/// Bind `addr` and serve the live reload stream on `endpoint`.
///
/// Returns the bound address (useful with port 0) and the accept loop task.
pub async fn spawn_reload_server(
    addr: &str,
    endpoint: String,
    engine_tx: mpsc::UnboundedSender<EngineEvent>,
) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding live reload server on {addr}"))?;
    let local = listener.local_addr()?;
    info!(addr = %local, endpoint = %endpoint, "live reload server listening");

    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let endpoint = endpoint.clone();
                    let engine_tx = engine_tx.clone();
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(stream, &endpoint, engine_tx).await {
                            debug!(%peer, error = %err, "live reload connection ended with error");
                        }
                    });
                }
                Err(err) => warn!(error = %err, "live reload accept failed"),
            }
        }
    });

    Ok((local, handle))
}

async fn handle_connection(
    stream: TcpStream,
    endpoint: &str,
    engine_tx: mpsc::UnboundedSender<EngineEvent>,
) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;
    // Drain headers up to the blank line.
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 || line == "\r\n" || line == "\n" {
            break;
        }
    }

    if !requests_endpoint(&request_line, endpoint) {
        write_half.write_all(NOT_FOUND.as_bytes()).await?;
        return Ok(());
    }

    // Registered before the headers go out, so a client that has seen the
    // response is guaranteed to get every later notification.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let (reply_tx, reply_rx) = oneshot::channel();
    engine_tx
        .send(EngineEvent::ClientConnected { tx, reply: reply_tx })
        .context("engine loop is gone")?;
    let client = reply_rx.await.context("engine dropped client registration")?;

    if let Err(err) = write_half.write_all(SSE_HEADERS.as_bytes()).await {
        let _ = engine_tx.send(EngineEvent::ClientDisconnected(client));
        return Err(err.into());
    }

    let mut scratch = [0u8; 256];
    let result: Result<()> = loop {
        tokio::select! {
            msg = rx.recv() => {
                let Some(path) = msg else { break Ok(()) };
                if let Err(err) = write_half.write_all(sse_frame(&path).as_bytes()).await {
                    break Err(err.into());
                }
            }
            read = reader.read(&mut scratch) => {
                match read {
                    // Client closed its side.
                    Ok(0) => break Ok(()),
                    Ok(_) => continue,
                    Err(err) => break Err(err.into()),
                }
            }
        }
    };

    let _ = engine_tx.send(EngineEvent::ClientDisconnected(client));
    result
}

/// True for `GET <endpoint>` with an optional query string.
fn requests_endpoint(request_line: &str, endpoint: &str) -> bool {
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return false;
    };
    let path = target.split('?').next().unwrap_or(target);
    method == "GET" && path == endpoint
}
