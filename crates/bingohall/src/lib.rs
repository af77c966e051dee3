//! # Bingohall
//!
//! A real-time bingo lobby and game server.
//!
//! Clients connect over WebSocket, create or join five-digit rooms, chat,
//! and play synchronized bingo rounds. This crate wires the layers
//! together: transport → protocol → session → room.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bingohall::prelude::*;
//!
//! # async fn run() -> Result<(), BingoError> {
//! let server = BingoServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod dispatch;
mod error;
mod handler;
mod logging;
mod server;

pub use error::BingoError;
pub use logging::init_tracing;
pub use server::{BingoServer, BingoServerBuilder, ServerConfig};

/// Everything needed to embed or test a server.
pub mod prelude {
    pub use crate::{BingoError, BingoServer, BingoServerBuilder, ServerConfig};

    pub use bingohall_board::{Board, Cell, Vocabulary};
    pub use bingohall_protocol::{
        ClientMessage, LeaderboardEntry, Outgoing, PlayerId, PlayerSummary,
        Position, RoomCode, ServerEvent,
    };
    pub use bingohall_room::{ErrorKind, RoomConfig, RoomError};
}
