//! Server configuration.

use blastforge_lobby::LobbyConfig;
use blastforge_sim::SimConfig;
use blastforge_tick::TickConfig;

/// Everything needed to start a [`BlastforgeServer`](crate::BlastforgeServer).
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
    /// Simulation ticks per second while a match runs.
    pub tick_rate_hz: u32,
    pub lobby: LobbyConfig,
    pub sim: SimConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8081".to_string(),
            tick_rate_hz: 20,
            lobby: LobbyConfig::default(),
            sim: SimConfig::default(),
        }
    }
}

impl ServerConfig {
    pub(crate) fn tick_config(&self) -> TickConfig {
        TickConfig::with_rate(self.tick_rate_hz).validated()
    }}
