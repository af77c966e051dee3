//! Bingohall server binary.

use std::time::Duration;

use bingohall::prelude::*;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "bingohall", version, about = "Real-time bingo lobby and game server")]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "BINGOHALL_BIND", default_value = "0.0.0.0:8080")]
    bind: String,

    /// Maximum players per room.
    #[arg(long, env = "BINGOHALL_MAX_PLAYERS", default_value_t = 10)]
    max_players: usize,

    /// Seconds a new peer has to finish the WebSocket upgrade.
    #[arg(long, env = "BINGOHALL_HANDSHAKE_TIMEOUT_SECS", default_value_t = 10)]
    handshake_timeout_secs: u64,

    /// Seconds between WebSocket pings.
    #[arg(long, env = "BINGOHALL_HEARTBEAT_SECS", default_value_t = 10)]
    heartbeat_secs: u64,

    /// Seconds of silence before a connection is dropped.
    #[arg(long, env = "BINGOHALL_IDLE_TIMEOUT_SECS", default_value_t = 30)]
    idle_timeout_secs: u64,
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind,
            handshake_timeout: Duration::from_secs(self.handshake_timeout_secs.max(1)),
            heartbeat_interval: Duration::from_secs(self.heartbeat_secs.max(1)),
            idle_timeout: Duration::from_secs(self.idle_timeout_secs.max(1)),
            room: RoomConfig {
                max_players: self.max_players,
                ..RoomConfig::default()
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), BingoError> {
    bingohall::init_tracing();
    let config = Cli::parse().into_config();

    let server = BingoServer::builder().config(config).build().await?;
    tracing::info!(addr = %server.config().bind_addr, "listening");

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    }
}
