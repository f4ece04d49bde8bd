//! Resilient client for the live position feed.
//!
//! One persistent websocket connection, a 30 s heartbeat while open, and an
//! automatic reconnect 3 s after any failure. Connection errors never reach
//! the caller; they only drive the reconnect loop.

use std::sync::Mutex;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use super::message::PositionUpdate;

/// Liveness ping interval while the connection is open. The server drops
/// connections that stay silent.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
/// Delay before a reconnect attempt after a failure or close.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

const HEARTBEAT_PAYLOAD: &str = "ping";
const SUBSCRIBER_BUFFER: usize = 64;

/// Observable connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    /// Connection lost; a reconnect is pending.
    Closed,
}

/// Client for the vehicle position feed.
///
/// An explicit component instance owned by the session lifecycle. Subscribers
/// receive every successfully parsed message exactly once per connection;
/// dropping the receiver unsubscribes.
pub struct FeedClient {
    url: String,
    updates_tx: broadcast::Sender<PositionUpdate>,
    state_tx: watch::Sender<ConnectionState>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl FeedClient {
    pub fn new(url: impl Into<String>) -> Self {
        let (updates_tx, _) = broadcast::channel(SUBSCRIBER_BUFFER);
        let (state_tx, _) = watch::channel(ConnectionState::Idle);
        Self {
            url: url.into(),
            updates_tx,
            state_tx,
            supervisor: Mutex::new(None),
        }
    }

    /// Subscribe to parsed position updates.
    pub fn subscribe(&self) -> broadcast::Receiver<PositionUpdate> {
        self.updates_tx.subscribe()
    }

    /// Watch the connection state.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        *self.state_tx.borrow() == ConnectionState::Open
    }

    /// Start the connection loop. No-op while a connection attempt or open
    /// connection already exists, so calling this twice never creates a
    /// second connection or a duplicate heartbeat.
    pub fn connect(&self) {
        let mut supervisor = self.supervisor.lock().unwrap();
        if let Some(task) = supervisor.as_ref() {
            if !task.is_finished() {
                return;
            }
        }

        let url = self.url.clone();
        let updates_tx = self.updates_tx.clone();
        let state_tx = self.state_tx.clone();
        *supervisor = Some(tokio::spawn(async move {
            run_connection_loop(url, updates_tx, state_tx).await;
        }));
    }

    /// Tear the connection down: cancels the heartbeat and any pending
    /// reconnect, closes the socket and resets to `Idle`. Waits for the
    /// connection loop to stop before publishing `Idle`, so no in-flight
    /// state update from the loop can land afterwards. `connect()` may be
    /// called again afterwards.
    pub async fn disconnect(&self) {
        let task = self.supervisor.lock().unwrap().take();
        if let Some(task) = task {
            task.abort();
            // Resolves with a cancellation error once the abort has landed.
            let _ = task.await;
        }
        self.state_tx.send_replace(ConnectionState::Idle);
    }
}

impl Drop for FeedClient {
    fn drop(&mut self) {
        if let Some(task) = self.supervisor.lock().unwrap().take() {
            task.abort();
        }
    }
}

/// Connect, pump messages until the connection dies, wait, repeat. Retries
/// are unbounded; only one reconnect can ever be pending because this loop is
/// the sole owner of the schedule.
async fn run_connection_loop(
    url: String,
    updates_tx: broadcast::Sender<PositionUpdate>,
    state_tx: watch::Sender<ConnectionState>,
) {
    loop {
        state_tx.send_replace(ConnectionState::Connecting);
        info!(url = %url, "Connecting to position feed");

        match connect_async(url.as_str()).await {
            Ok((socket, _response)) => {
                info!("Position feed connected");
                state_tx.send_replace(ConnectionState::Open);
                pump_messages(socket, &updates_tx).await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to connect to position feed");
            }
        }

        state_tx.send_replace(ConnectionState::Closed);
        info!(delay_secs = RECONNECT_DELAY.as_secs(), "Reconnecting to position feed");
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

/// Drive one open connection: forward parsed messages to subscribers and
/// send the heartbeat. Returns when the connection is gone.
async fn pump_messages(
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    updates_tx: &broadcast::Sender<PositionUpdate>,
) {
    let (mut sender, mut receiver) = socket.split();
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    // Skip the first tick which fires immediately.
    heartbeat.tick().await;

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                if let Err(e) = sender.send(Message::Text(HEARTBEAT_PAYLOAD.into())).await {
                    warn!(error = %e, "Failed to send heartbeat");
                    break;
                }
                debug!("Sent heartbeat");
            }
            message = receiver.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<PositionUpdate>(&text) {
                            Ok(update) => {
                                debug!(vehicle = update.vehicle, position = update.position, "Received position update");
                                // No subscribers is fine; the message is dropped.
                                let _ = updates_tx.send(update);
                            }
                            Err(e) => {
                                warn!(error = %e, "Dropping malformed feed message");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = sender.send(Message::Pong(payload)).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!(frame = ?frame, "Position feed closed by server");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "Position feed connection error");
                        break;
                    }
                    None => {
                        info!("Position feed stream ended");
                        break;
                    }
                }
            }
        }
    }
}
