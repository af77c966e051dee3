//! Wire protocol for Bingohall.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Types** ([`ClientMessage`], [`ServerEvent`], [`Outgoing`], etc.) -
//!   the JSON objects that travel on the wire, each tagged by `type`.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! It also defines [`Delivery`], the unit the room layer hands to the
//! dispatcher: a message plus the connections it is addressed to.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage / Outgoing) → Room registry
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientMessage, Delivery, LeaderboardEntry, Outgoing, PlayerId,
    PlayerSummary, Position, RoomCode, ServerEvent,
};
