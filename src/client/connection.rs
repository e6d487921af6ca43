//! WebSocket connection state machine.
//!
//! The manager owns at most one live link to the backend. Sending while the
//! link is down triggers a bounded reconnect, after which the pending edit is
//! re-sent exactly once.

use super::error::ConnectionError;
use crate::config::ConnectionConfig;
use crate::dashboard::types::{ClientEdit, ServerState};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Event produced by a link's background task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Text frame received from the backend
    Frame { link_id: u64, text: String },
    /// Link ended (server close, read error or write error)
    Closed {
        link_id: u64,
        reason: Option<String>,
    },
}

/// Lifecycle of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Handshake in progress
    Connecting,
    /// Link is up and writable
    Open,
    /// Link is down; `attempts` reconnects have been made for the pending edit
    ClosedPendingRetry { attempts: u32 },
    /// Reconnects for the last pending edit were exhausted
    Closed,
}

/// Bounded reconnect policy. No exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

impl From<&ConnectionConfig> for RetryPolicy {
    fn from(config: &ConnectionConfig) -> Self {
        Self {
            max_attempts: config.max_reconnect_attempts,
            delay: Duration::from_millis(config.reconnect_delay_ms),
        }
    }
}

/// How a successful `send` reached the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Written on the already open link
    Sent,
    /// Written after reconnecting
    Resent { attempts: u32 },
}

/// Counters kept for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    pub connects: u32,
    pub reconnect_attempts: u32,
    pub frames_sent: u64,
    pub resends: u32,
}

/// A live link: the writer half is fed through `outbound`, the reader half
/// reports to the session through the event channel.
#[derive(Debug)]
pub struct Link {
    outbound: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl Link {
    pub fn new(outbound: mpsc::UnboundedSender<String>, task: JoinHandle<()>) -> Self {
        Self { outbound, task }
    }

    pub fn is_alive(&self) -> bool {
        !self.outbound.is_closed() && !self.task.is_finished()
    }

    fn send(&self, frame: String) -> Result<(), String> {
        if !self.is_alive() {
            return Err("link is closed".to_string());
        }
        self.outbound
            .send(frame)
            .map_err(|_| "link writer has stopped".to_string())
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Opens links to the backend.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establish a link. Events must be tagged with `link_id`.
    async fn connect(
        &self,
        link_id: u64,
        events: mpsc::UnboundedSender<ConnectionEvent>,
    ) -> Result<Link, ConnectionError>;
}

/// Connection manager driving the state machine.
pub struct ConnectionManager<C: Connector> {
    connector: C,
    policy: RetryPolicy,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    state: ConnectionState,
    link: Option<Link>,
    current_link_id: u64,
    stats: ConnectionStats,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(
        connector: C,
        policy: RetryPolicy,
        events: mpsc::UnboundedSender<ConnectionEvent>,
    ) -> Self {
        Self {
            connector,
            policy,
            events,
            state: ConnectionState::ClosedPendingRetry { attempts: 0 },
            link: None,
            current_link_id: 0,
            stats: ConnectionStats::default(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn stats(&self) -> ConnectionStats {
        self.stats
    }

    /// Whether an event comes from the link currently in use.
    pub fn is_current(&self, link_id: u64) -> bool {
        self.link.is_some() && link_id == self.current_link_id
    }

    /// Initial connect at session start. No retry on failure; the next
    /// send reconnects.
    pub async fn open(&mut self) -> Result<(), ConnectionError> {
        match self.connect_link().await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "Initial WebSocket connect failed");
                self.state = ConnectionState::ClosedPendingRetry { attempts: 0 };
                Err(e)
            }
        }
    }

    /// Drop the current link and connect again.
    pub async fn reopen(&mut self) -> Result<(), ConnectionError> {
        self.link = None;
        self.open().await
    }

    /// Send a sparse patch, reconnecting once per policy attempt if needed.
    pub async fn send(&mut self, edit: &ClientEdit) -> Result<SendOutcome, ConnectionError> {
        let frame = edit.to_frame()?;

        if self.state == ConnectionState::Open {
            if let Some(link) = &self.link {
                match link.send(frame.clone()) {
                    Ok(()) => {
                        self.stats.frames_sent += 1;
                        tracing::debug!(fields = ?edit.fields(), "Sent edit");
                        return Ok(SendOutcome::Sent);
                    }
                    Err(reason) => {
                        tracing::warn!(link_id = self.current_link_id, reason, "Send failed on open link");
                    }
                }
            }
        }

        self.link = None;
        self.state = ConnectionState::ClosedPendingRetry { attempts: 0 };
        self.reconnect_and_resend(frame).await
    }

    async fn reconnect_and_resend(&mut self, frame: String) -> Result<SendOutcome, ConnectionError> {
        let mut last_error = String::from("no reconnect attempt allowed");

        for attempt in 1..=self.policy.max_attempts {
            if attempt > 1 && !self.policy.delay.is_zero() {
                tokio::time::sleep(self.policy.delay).await;
            }

            self.stats.reconnect_attempts += 1;
            tracing::info!(attempt, max_attempts = self.policy.max_attempts, "Reconnecting WebSocket");

            if let Err(e) = self.connect_link().await {
                tracing::warn!(attempt, error = %e, "Reconnect attempt failed");
                last_error = e.to_string();
                self.state = ConnectionState::ClosedPendingRetry { attempts: attempt };
                continue;
            }

            let sent = match &self.link {
                Some(link) => link.send(frame.clone()),
                None => Err("link missing after connect".to_string()),
            };
            match sent {
                Ok(()) => {
                    self.stats.frames_sent += 1;
                    self.stats.resends += 1;
                    tracing::info!(attempt, "Re-sent pending edit after reconnect");
                    return Ok(SendOutcome::Resent { attempts: attempt });
                }
                Err(reason) => {
                    last_error = reason;
                    self.link = None;
                    self.state = ConnectionState::ClosedPendingRetry { attempts: attempt };
                }
            }
        }

        self.state = ConnectionState::Closed;
        tracing::error!(
            attempts = self.policy.max_attempts,
            error = %last_error,
            "Giving up on pending edit"
        );
        Err(ConnectionError::ReconnectExhausted {
            attempts: self.policy.max_attempts,
            last_error,
        })
    }

    async fn connect_link(&mut self) -> Result<(), ConnectionError> {
        self.current_link_id += 1;
        let link_id = self.current_link_id;
        self.state = ConnectionState::Connecting;

        let link = self.connector.connect(link_id, self.events.clone()).await?;
        self.link = Some(link);
        self.state = ConnectionState::Open;
        self.stats.connects += 1;
        tracing::info!(link_id, "WebSocket open");
        Ok(())
    }

    /// React to a link ending on its own. Stale links are ignored.
    pub fn handle_closed(&mut self, link_id: u64, reason: Option<&str>) {
        if !self.is_current(link_id) {
            tracing::debug!(link_id, "Ignoring close of stale link");
            return;
        }
        tracing::warn!(link_id, reason = reason.unwrap_or("none"), "WebSocket closed");
        self.link = None;
        self.state = ConnectionState::ClosedPendingRetry { attempts: 0 };
    }

    /// Close the link for good.
    pub fn shutdown(&mut self) {
        self.link = None;
        self.state = ConnectionState::Closed;
    }
}

/// Wait for the next parseable state push. Unparseable frames are skipped.
pub async fn next_state(
    events: &mut mpsc::UnboundedReceiver<ConnectionEvent>,
    timeout: Duration,
) -> Result<ServerState, ConnectionError> {
    let wait = async {
        while let Some(event) = events.recv().await {
            match event {
                ConnectionEvent::Frame { text, .. } => match ServerState::from_frame(&text) {
                    Ok(state) => return Ok(state),
                    Err(e) => tracing::warn!(error = %e, "Skipping unparseable state push"),
                },
                ConnectionEvent::Closed { .. } => return Err(ConnectionError::ClosedBeforeState),
            }
        }
        Err(ConnectionError::ClosedBeforeState)
    };

    tokio::time::timeout(timeout, wait)
        .await
        .map_err(|_| ConnectionError::StateTimeout(timeout.as_secs()))?
}
