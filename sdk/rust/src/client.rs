use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("server refused the session with status {0}")]
    Refused(u16),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("malformed server frame: {0}")]
    Frame(#[from] serde_json::Error),
    #[error("connection closed")]
    Closed,
}

/// One push from the server: every resource of `kind` at `version_info`.
#[derive(Debug, Clone, Deserialize)]
pub struct Push {
    pub kind: String,
    pub type_url: String,
    pub version_info: String,
    pub nonce: String,
    pub resources: Vec<serde_json::Value>,
}

impl Push {
    /// Resource names, in push order. Endpoint assignments are named by
    /// their cluster.
    pub fn names(&self) -> Vec<String> {
        self.resources
            .iter()
            .filter_map(|r| r.get("name").or_else(|| r.get("cluster_name")))
            .filter_map(|n| n.as_str().map(str::to_string))
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Incoming {
    Push(Push),
}

#[derive(Serialize)]
struct Ack<'a> {
    #[serde(rename = "type")]
    kind_tag: &'static str,
    kind: &'a str,
    version_info: &'a str,
    nonce: &'a str,
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_detail: Option<&'a str>,
}

fn discovery_url(base_url: &str, node_id: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("node_id", node_id)
        .finish();
    format!("{}/v1/discovery?{}", base_url.trim_end_matches('/'), query)
}

/// A subscriber session over WebSocket.
pub struct SubscriberClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl SubscriberClient {
    /// Connect to `base_url` (e.g. `ws://127.0.0.1:18000`) as `node_id`.
    pub async fn connect(base_url: &str, node_id: &str) -> Result<Self, ClientError> {
        let url = discovery_url(base_url, node_id);
        match connect_async(url).await {
            Ok((stream, _response)) => Ok(Self { stream }),
            Err(tungstenite::Error::Http(response)) => Err(ClientError::Refused(response.status().as_u16())),
            Err(e) => Err(e.into()),
        }
    }

    /// Wait for the next push.
    pub async fn next_push(&mut self) -> Result<Push, ClientError> {
        while let Some(frame) = self.stream.next().await {
            match frame? {
                Message::Text(text) => {
                    let Incoming::Push(push) = serde_json::from_str(text.as_str())?;
                    return Ok(push);
                }
                Message::Close(_) => return Err(ClientError::Closed),
                _ => {}
            }
        }
        Err(ClientError::Closed)
    }

    /// Like `next_push`, but gives up after `wait`.
    pub async fn next_push_within(&mut self, wait: Duration) -> Result<Option<Push>, ClientError> {
        match tokio::time::timeout(wait, self.next_push()).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Accept a push.
    pub async fn ack(&mut self, push: &Push) -> Result<(), ClientError> {
        self.respond(push, true, None).await
    }

    /// Reject a push with a reason.
    pub async fn nack(&mut self, push: &Push, detail: &str) -> Result<(), ClientError> {
        self.respond(push, false, Some(detail)).await
    }

    async fn respond(&mut self, push: &Push, accepted: bool, error_detail: Option<&str>) -> Result<(), ClientError> {
        let ack = Ack {
            kind_tag: "ack",
            kind: &push.kind,
            version_info: &push.version_info,
            nonce: &push.nonce,
            accepted,
            error_detail,
        };
        self.send_text(serde_json::to_string(&ack)?).await
    }

    /// Send an arbitrary text frame.
    pub async fn send_text(&mut self, text: String) -> Result<(), ClientError> {
        self.stream.send(Message::Text(text.into())).await?;
        Ok(())
    }

    pub async fn close(mut self) -> Result<(), ClientError> {
        self.stream.close(None).await?;
        Ok(())
    }
}
