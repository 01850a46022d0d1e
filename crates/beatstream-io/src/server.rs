//! WebSocket server: one independent session per connection.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use beatstream_config::ServerConfig;
use beatstream_core::ComputeBackend;
use futures_util::{SinkExt, StreamExt, future};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_tungstenite::accept_async_with_config;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use crate::Result;
use crate::session::StreamingSession;

/// Bind the configured address and serve until Ctrl+C.
pub async fn serve(config: ServerConfig) -> Result<()> {
    config.validate()?;
    let listener = TcpListener::bind(config.addr()).await?;
    serve_listener(listener, config, shutdown_signal()).await
}

/// Serve connections from an already-bound listener until `shutdown` resolves.
///
/// The compute backend is selected once here and shared by every session.
/// Running sessions are aborted on shutdown.
pub async fn serve_listener<F>(
    listener: TcpListener,
    config: ServerConfig,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    config.validate()?;
    let backend = beatstream_core::select(config.backend);
    let caps = beatstream_core::detect_capabilities();
    let config = Arc::new(config);

    tracing::info!(
        addr = %listener.local_addr()?,
        backend = %backend.kind(),
        accelerated_available = caps.accelerated_available(),
        available_threads = caps.available_threads,
        sample_rate = config.sample_rate,
        block_size = config.block_size,
        "server listening"
    );

    let mut sessions = JoinSet::new();
    let mut next_id = 0u64;
    let mut shutdown = std::pin::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                tracing::info!(active = sessions.len(), "shutting down");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    next_id += 1;
                    sessions.spawn(handle_connection(
                        stream,
                        peer,
                        next_id,
                        Arc::clone(&config),
                        Arc::clone(&backend),
                    ));
                }
                Err(e) => tracing::warn!(error = %e, "accept failed"),
            },
            Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "session task failed");
                }
            }
        }
    }

    sessions.shutdown().await;
    Ok(())
}

fn websocket_config(config: &ServerConfig) -> WebSocketConfig {
    let mut ws = WebSocketConfig::default();
    ws.max_message_size = config.max_message_size;
    ws.max_frame_size = config.max_message_size;
    ws
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    id: u64,
    config: Arc<ServerConfig>,
    backend: Arc<dyn ComputeBackend>,
) {
    let ws = match accept_async_with_config(stream, Some(websocket_config(&config))).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::warn!(%peer, error = %e, "websocket handshake failed");
            return;
        }
    };
    tracing::info!(session = id, %peer, "client connected");

    let session = match StreamingSession::new(id, &config, backend) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(session = id, error = %e, "could not start session");
            return;
        }
    };

    let (write, read) = ws.split();
    let sink = write.with(|frame: Vec<u8>| future::ok::<_, WsError>(Message::Binary(frame)));
    let inbound = read
        .take_while(|msg| future::ready(matches!(msg, Ok(m) if !m.is_close())))
        .filter_map(|msg| {
            future::ready(match msg {
                Ok(Message::Text(text)) => Some(text),
                _ => None,
            })
        });

    session.run(sink, inbound).await;
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for Ctrl+C; serving until killed");
        future::pending::<()>().await;
    }
}
