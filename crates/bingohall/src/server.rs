//! `BingoServer` builder and accept loop.
//!
//! This is the entry point for running a Bingohall server. It ties
//! together all the layers: transport → protocol → session → room.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bingohall_protocol::{Codec, JsonCodec};
use bingohall_room::{RoomConfig, RoomRegistry};
use bingohall_session::SessionManager;
use bingohall_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::BingoError;
use crate::handler::handle_connection;

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Server-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: String,

    /// How long a new peer has to complete the WebSocket upgrade.
    pub handshake_timeout: Duration,

    /// How often each connection is sent a WebSocket ping.
    pub heartbeat_interval: Duration,

    /// A connection that sends nothing for this long is closed.
    pub idle_timeout: Duration,

    /// Settings every room runs with.
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            handshake_timeout: Duration::from_secs(10),
            heartbeat_interval: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(30),
            room: RoomConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared server state passed to each connection handler task.
///
/// Lock order is `rooms` then `sessions`. Code that only needs to queue
/// a reply to its own connection takes `sessions` alone.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: Mutex<RoomRegistry>,
    pub(crate) sessions: Mutex<SessionManager>,
    pub(crate) codec: C,
    pub(crate) handshake_timeout: Duration,
    pub(crate) heartbeat_interval: Duration,
    pub(crate) idle_timeout: Duration,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and starting a Bingohall server.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use bingohall::prelude::*;
///
/// # async fn run() -> Result<(), BingoError> {
/// let server = BingoServer::builder()
///     .bind("0.0.0.0:8080")
///     .idle_timeout(Duration::from_secs(60))
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct BingoServerBuilder {
    config: ServerConfig,
    seed: Option<u64>,
}

impl BingoServerBuilder {
    /// Creates a new builder with default settings.
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

    /// Sets how long a new peer may take to finish the WebSocket upgrade.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    /// Sets how often connections are pinged.
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval = interval;
        self
    }

    /// Sets how long a silent connection is kept open.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Sets the room configuration.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.config.room = config;
        self
    }

    /// Seeds room codes, player ids and boards. For tests.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Binds the listener and builds a server speaking JSON.
    ///
    /// # Errors
    /// - [`BingoError::Room`] if the room configuration is unusable
    /// - [`BingoError::Transport`] if the address cannot be bound
    pub async fn build(self) -> Result<BingoServer<JsonCodec>, BingoError> {
        self.build_with_codec(JsonCodec).await
    }

    /// Binds the listener and builds a server with a custom codec.
    ///
    /// # Errors
    /// Same as [`build`](Self::build).
    pub async fn build_with_codec<C: Codec>(
        self,
        codec: C,
    ) -> Result<BingoServer<C>, BingoError> {
        let config = self.config;
        let rooms = match self.seed {
            Some(seed) => RoomRegistry::with_seed(config.room.clone(), seed)?,
            None => RoomRegistry::new(config.room.clone())?,
        };
        let transport = WebSocketTransport::bind(&config.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: Mutex::new(rooms),
            sessions: Mutex::new(SessionManager::new()),
            codec,
            handshake_timeout: config.handshake_timeout,
            heartbeat_interval: config.heartbeat_interval,
            idle_timeout: config.idle_timeout,
        });

        Ok(BingoServer {
            transport,
            state,
            config,
        })
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// A bound Bingohall server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct BingoServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
    config: ServerConfig,
}

impl BingoServer {
    /// Creates a new builder.
    pub fn builder() -> BingoServerBuilder {
        BingoServerBuilder::new()
    }
}

impl<C: Codec> BingoServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// The configuration the server was built with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Runs the accept loop.
    ///
    /// Spawns a handler task for every accepted socket; the WebSocket
    /// upgrade happens inside that task, so a stalled peer only holds up
    /// itself. Runs until the process is terminated or the future is
    /// dropped.
    pub async fn run(mut self) -> Result<(), BingoError> {
        tracing::info!(addr = ?self.local_addr().ok(), "Bingohall server running");

        loop {
            match self.transport.accept().await {
                Ok(pending) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(pending, state).await {
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
