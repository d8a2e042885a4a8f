//! WebSocket transport for the discovery protocol.
//!
//! # Responsibilities
//! - Accept `GET /v1/discovery?node_id=<id>` upgrades
//! - Refuse sessions beyond the cap with 503
//! - Bridge socket frames to the engine's session channels
//!
//! # Data Flow
//! ```text
//! socket ── reader task ── ClientMessage ──▶ engine.run_session
//! socket ◀─ writer task ◀─ ServerMessage ───┘
//! ```
//!
//! # Design Decisions
//! - Frames that do not parse are logged and dropped; the session lives on
//! - Binary frames are ignored, a close frame ends the session
//! - The writer drains queued pushes before closing the socket

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use crate::distribution::engine::{DistributionEngine, TransportError};
use crate::distribution::protocol::{ClientMessage, NodeId, ServerMessage};
use crate::lifecycle::Shutdown;
use crate::net::SessionLimit;

pub const DISCOVERY_PATH: &str = "/v1/discovery";

#[derive(Clone)]
struct DiscoveryState {
    engine: Arc<DistributionEngine>,
    limit: SessionLimit,
    send_buffer: usize,
    shutdown: Shutdown,
}

#[derive(Debug, Deserialize)]
struct ConnectParams {
    node_id: Option<String>,
}

/// HTTP server exposing the discovery endpoint.
pub struct DiscoveryServer {
    router: Router,
}

impl DiscoveryServer {
    pub fn new(
        engine: Arc<DistributionEngine>,
        limit: SessionLimit,
        send_buffer: usize,
        shutdown: Shutdown,
    ) -> Self {
        let state = DiscoveryState {
            engine,
            limit,
            send_buffer: send_buffer.max(1),
            shutdown,
        };
        let router = Router::new()
            .route(DISCOVERY_PATH, get(discovery_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http());
        Self { router }
    }

    /// Serve until the shutdown signal fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, path = DISCOVERY_PATH, "Discovery server starting");

        let mut stop = shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = stop.recv().await;
            })
            .await?;

        tracing::info!("Discovery server stopped");
        Ok(())
    }
}

async fn discovery_handler(
    State(state): State<DiscoveryState>,
    Query(params): Query<ConnectParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(permit) = state.limit.try_acquire() else {
        tracing::warn!(node_id = ?params.node_id, "Session limit reached, refusing subscriber");
        return (StatusCode::SERVICE_UNAVAILABLE, "Session limit reached").into_response();
    };

    let node = NodeId::from_optional(params.node_id);
    ws.on_upgrade(move |socket| async move {
        let _permit = permit;
        serve_socket(state, node, socket).await;
    })
}

async fn serve_socket(state: DiscoveryState, node: NodeId, socket: WebSocket) {
    let (mut sink, mut stream) = socket.split();
    let (inbound_tx, inbound_rx) = mpsc::channel::<ClientMessage>(state.send_buffer);
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerMessage>(state.send_buffer);

    let writer = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode push");
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(text.into())).await {
                tracing::debug!(error = %e, "Subscriber socket write failed");
                return;
            }
        }
        let _ = sink.close().await;
    });

    let reader_node = node.clone();
    let reader = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame? {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(message) => {
                        if inbound_tx.send(message).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(node_id = %reader_node, error = %e, "Ignoring unparseable frame");
                    }
                },
                Message::Close(_) => break,
                Message::Binary(_) => {
                    tracing::debug!(node_id = %reader_node, "Ignoring binary frame");
                }
                _ => {}
            }
        }
        Ok::<(), TransportError>(())
    });

    // Session-level errors are logged by the engine.
    let node_id = node.clone();
    let _ = state
        .engine
        .run_session(node, inbound_rx, outbound_tx, state.shutdown.subscribe())
        .await;

    reader.abort();
    if let Ok(Err(e)) = reader.await {
        tracing::warn!(node_id = %node_id, error = %e, "Subscriber transport failed");
    }
    let _ = writer.await;
}
