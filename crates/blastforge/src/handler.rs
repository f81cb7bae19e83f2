//! Per-connection handler: register with the arena, pump frames both ways.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`]. A second task drains the client's outbound channel
//! into the socket, so a slow reader on one connection never delays the
//! arena or the other clients. A reader that stays slow overflows its queue
//! and is dropped by the arena.

use std::sync::Arc;
use std::time::Duration;

use blastforge_protocol::{ClientMessage, Codec, JsonCodec, PlayerId};
use blastforge_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::arena::{ArenaHandle, Outbound, CLIENT_QUEUE_SIZE};
use crate::BlastforgeError;

/// A single frame write that takes longer than this drops the client.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Drop guard that releases the player's arena slot when the handler exits.
///
/// Runs even if the handler panics. `Drop` is synchronous, so the async
/// disconnect is spawned.
struct ArenaGuard {
    player_id: PlayerId,
    arena: ArenaHandle,
}

impl Drop for ArenaGuard {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let arena = self.arena.clone();
        tokio::spawn(async move {
            let _ = arena.disconnect(player_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    arena: ArenaHandle,
    codec: JsonCodec,
) -> Result<(), BlastforgeError> {
    let conn_id = conn.id();
    let player_id = PlayerId(conn_id.into_inner());
    tracing::info!(%conn_id, %player_id, "client connected");

    let conn = Arc::new(conn);
    let (tx, rx) = mpsc::channel(CLIENT_QUEUE_SIZE);
    arena.connect(player_id, tx).await?;
    let _guard = ArenaGuard {
        player_id,
        arena: arena.clone(),
    };

    let mut writer = tokio::spawn(write_loop(Arc::clone(&conn), rx));

    tokio::select! {
        result = read_loop(&conn, &arena, &codec, player_id) => result?,
        _ = &mut writer => {
            tracing::debug!(%player_id, "writer finished, closing reader");
        }
    }

    tracing::info!(%conn_id, %player_id, "client disconnected");
    // _guard drops here → arena disconnect fires, which drops the sender and
    // lets the writer drain and exit.
    Ok(())
}

async fn read_loop(
    conn: &WebSocketConnection,
    arena: &ArenaHandle,
    codec: &JsonCodec,
    player_id: PlayerId,
) -> Result<(), BlastforgeError> {
    loop {
        let frame = match conn.recv().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::debug!(%player_id, "connection closed cleanly");
                return Ok(());
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                return Ok(());
            }
        };

        let msg: ClientMessage = match codec.decode(&frame) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "dropping malformed message");
                continue;
            }
        };

        arena.send_message(player_id, msg).await?;
    }
}

async fn write_loop(conn: Arc<WebSocketConnection>, mut rx: mpsc::Receiver<Outbound>) {
    while let Some(outbound) = rx.recv().await {
        match outbound {
            Outbound::Frame(frame) => {
                let sent = tokio::time::timeout(SEND_TIMEOUT, conn.send(&frame)).await;
                match sent {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::debug!(conn_id = %conn.id(), error = %e, "send failed");
                        break;
                    }
                    Err(_) => {
                        tracing::debug!(conn_id = %conn.id(), "send timed out");
                        break;
                    }
                }
            }
            Outbound::Close => {
                let _ = conn.close().await;
                break;
            }
        }
    }
}
