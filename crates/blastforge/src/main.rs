use blastforge::{BlastforgeError, BlastforgeServer, ServerConfig};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Authoritative multiplayer bomb-arena server.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to bind the WebSocket listener to
    #[arg(short, long, default_value = "127.0.0.1:8081")]
    bind: String,
    /// Simulation ticks per second while a match runs
    #[arg(short, long, default_value_t = 20)]
    tick_rate: u32,
    /// Seconds to wait for more players once the minimum has joined
    #[arg(long, default_value_t = 20)]
    waiting_secs: u32,
    /// Length of the pre-match countdown in seconds
    #[arg(long, default_value_t = 10)]
    countdown_secs: u32,
}

#[tokio::main]
async fn main() -> Result<(), BlastforgeError> {
    // RUST_LOG=blastforge=debug,blastforge_sim=debug for verbose output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .compact()
        .init();

    let args = Args::parse();

    let mut config = ServerConfig {
        bind_addr: args.bind,
        tick_rate_hz: args.tick_rate,
        ..ServerConfig::default()
    };
    config.lobby.waiting_secs = args.waiting_secs;
    config.lobby.countdown_secs = args.countdown_secs;

    let server = BlastforgeServer::builder().config(config).build().await?;
    if let Ok(addr) = server.local_addr() {
        tracing::info!(%addr, "listening");
    }
    server.run().await
}
