//! `tokio-tungstenite` implementation of [`Connector`].

use super::connection::{ConnectionEvent, Connector, Link};
use super::error::ConnectionError;
use crate::config::{ConnectionConfig, ServerConfig};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;

/// Connects to the backend's `/ws` endpoint.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
    connect_timeout: Duration,
}

impl WsConnector {
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            connect_timeout,
        }
    }

    pub fn from_config(server: &ServerConfig, connection: &ConnectionConfig) -> Self {
        Self::new(
            server.websocket_url(),
            Duration::from_secs(connection.connect_timeout_seconds),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(
        &self,
        link_id: u64,
        events: mpsc::UnboundedSender<ConnectionEvent>,
    ) -> Result<Link, ConnectionError> {
        let (ws_stream, _response) =
            tokio::time::timeout(self.connect_timeout, connect_async(self.url.as_str()))
                .await
                .map_err(|_| ConnectionError::Timeout(self.connect_timeout.as_secs()))?
                .map_err(|e| ConnectionError::Connect(e.to_string()))?;

        let (mut write_half, mut read_half) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();

        let task = tokio::spawn(async move {
            tracing::debug!(link_id, "WebSocket pump started");

            let reason = loop {
                tokio::select! {
                    outgoing = outbound_rx.recv() => match outgoing {
                        Some(text) => {
                            if let Err(e) = write_half.send(Message::Text(text.into())).await {
                                break Some(format!("write failed: {}", e));
                            }
                        }
                        None => {
                            // Link dropped by the manager
                            let _ = write_half.close().await;
                            return;
                        }
                    },
                    incoming = read_half.next() => match incoming {
                        Some(Ok(Message::Text(text))) => {
                            let _ = events.send(ConnectionEvent::Frame {
                                link_id,
                                text: text.as_str().to_owned(),
                            });
                        }
                        Some(Ok(Message::Close(frame))) => {
                            break Some(format!("closed by server: {:?}", frame));
                        }
                        Some(Ok(_)) => {
                            // ping/pong and binary frames carry no state
                        }
                        Some(Err(e)) => break Some(format!("read failed: {}", e)),
                        None => break None,
                    },
                }
            };

            let _ = events.send(ConnectionEvent::Closed { link_id, reason });
            tracing::debug!(link_id, "WebSocket pump ended");
        });

        Ok(Link::new(outbound_tx, task))
    }
}
