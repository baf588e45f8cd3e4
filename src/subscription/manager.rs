use crate::state::WorldState;
use crate::subscription::protocol::TrainUpdateMessage;
use axum::extract::ws::{Message, WebSocket};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Manages a single WebSocket subscriber connection
#[derive(Default)]
pub struct ConnectionManager;

impl ConnectionManager {
    pub fn new() -> Self {
        Self
    }

    /// Handle WebSocket connection lifecycle.
    ///
    /// Sends the initial snapshot first so the client is synchronized
    /// without waiting for the next mutation, then forwards every
    /// broadcast snapshot. A send failure closes only this connection.
    pub async fn handle(
        self,
        mut socket: WebSocket,
        initial: WorldState,
        mut state_rx: broadcast::Receiver<WorldState>,
    ) {
        info!("WebSocket connection established");

        if let Err(e) = send_state(&mut socket, initial).await {
            warn!(error = %e, "Failed to send initial snapshot");
            return;
        }

        loop {
            tokio::select! {
                // Handle incoming client messages
                Some(msg) = socket.recv() => {
                    match msg {
                        Ok(Message::Close(_)) => {
                            info!("WebSocket client disconnected");
                            break;
                        }
                        Ok(Message::Ping(data)) => {
                            if let Err(e) = socket.send(Message::Pong(data)).await {
                                error!(error = %e, "Failed to send pong");
                                break;
                            }
                        }
                        Ok(_) => {
                            // No client → server protocol; ignore text, binary, pong
                        }
                        Err(e) => {
                            warn!(error = %e, "WebSocket error");
                            break;
                        }
                    }
                }

                // Forward full-state snapshots from the broadcast channel
                result = state_rx.recv() => {
                    match result {
                        Ok(world) => {
                            if let Err(e) = send_state(&mut socket, world).await {
                                error!(error = %e, "Failed to send state update");
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            // Each snapshot is the full state, so nothing is
                            // lost semantically; the next one catches up
                            warn!(skipped = skipped, "WebSocket lagged, skipped snapshots");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            error!("State broadcast channel closed");
                            break;
                        }
                    }
                }

                else => {
                    break;
                }
            }
        }

        info!("WebSocket connection closed");
    }
}

/// Send one full-state `train_update` message to the client
async fn send_state(socket: &mut WebSocket, world: WorldState) -> anyhow::Result<()> {
    let msg = TrainUpdateMessage::from(world);
    let json = serde_json::to_string(&msg)?;
    socket.send(Message::Text(json)).await?;
    Ok(())
}
