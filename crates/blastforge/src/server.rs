//! `BlastforgeServer` builder and accept loop.

use blastforge_lobby::LobbyConfig;
use blastforge_protocol::JsonCodec;
use blastforge_sim::SimConfig;
use blastforge_transport::{Incoming, Transport, WebSocketTransport};

use crate::arena::{spawn_arena, ArenaHandle};
use crate::handler::handle_connection;
use crate::{BlastforgeError, ServerConfig};

/// Capacity of the arena command queue.
const ARENA_CHANNEL_SIZE: usize = 64;

/// Builder for configuring and starting a Blastforge server.
///
/// # Example
///
/// ```rust,no_run
/// # async fn run() -> Result<(), blastforge::BlastforgeError> {
/// let server = blastforge::BlastforgeServer::builder()
///     .bind("0.0.0.0:8081")
///     .tick_rate(20)
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct BlastforgeServerBuilder {
    config: ServerConfig,
}

impl BlastforgeServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn tick_rate(mut self, hz: u32) -> Self {
        self.config.tick_rate_hz = hz;
        self
    }

    pub fn lobby_config(mut self, config: LobbyConfig) -> Self {
        self.config.lobby = config;
        self
    }

    pub fn sim_config(mut self, config: SimConfig) -> Self {
        self.config.sim = config;
        self
    }

    /// Binds the listener and spawns the arena.
    ///
    /// Must be called from inside a Tokio runtime.
    pub async fn build(self) -> Result<BlastforgeServer, BlastforgeError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let tick_config = self.config.tick_config();
        let arena = spawn_arena(
            self.config.lobby,
            self.config.sim,
            tick_config,
            ARENA_CHANNEL_SIZE,
        );
        Ok(BlastforgeServer {
            transport,
            arena,
            codec: JsonCodec,
        })
    }
}

/// A bound Blastforge server. Call [`run()`](Self::run) to start accepting
/// connections.
pub struct BlastforgeServer {
    transport: WebSocketTransport,
    arena: ArenaHandle,
    codec: JsonCodec,
}

impl BlastforgeServer {
    pub fn builder() -> BlastforgeServerBuilder {
        BlastforgeServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// A handle to the arena, e.g. for querying its status.
    pub fn arena(&self) -> ArenaHandle {
        self.arena.clone()
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Each socket is upgraded in its own task, so a peer that never finishes
    /// the handshake only times out itself. A failed accept is logged and
    /// skipped.
    pub async fn run(mut self) -> Result<(), BlastforgeError> {
        tracing::info!("Blastforge server running");

        loop {
            match self.transport.accept().await {
                Ok(pending) => {
                    let arena = self.arena.clone();
                    let codec = self.codec;
                    tokio::spawn(async move {
                        let peer = pending.peer_addr();
                        let conn = match pending.establish().await {
                            Ok(conn) => conn,
                            Err(e) => {
                                tracing::debug!(%peer, error = %e, "handshake failed");
                                return;
                            }
                        };
                        if let Err(e) = handle_connection(conn, arena, codec).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
