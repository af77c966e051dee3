//! Room lifecycle and game flow for Bingohall.
//!
//! Rooms are plain data owned by a single [`RoomRegistry`]. The server
//! keeps the registry behind one lock and applies each client request as a
//! single synchronous step, so every operation here returns the
//! [`Delivery`](bingohall_protocol::Delivery) values it produced instead of
//! sending anything itself.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates/deletes rooms, routes connections to them
//! - [`Room`] / [`Player`]: membership, leadership, room-scoped fan-out
//! - [`GameState`]: the lobby/round state machine
//! - [`RoomConfig`]: capacity, username and board settings
//! - [`RoomError`] / [`ErrorKind`]: why a request was rejected

mod config;
mod error;
mod game;
mod registry;
mod room;

pub use config::{GameState, RoomConfig};
pub use error::{ErrorKind, RoomError};
pub use registry::{Joined, Kicked, Membership, RoomRegistry, now_millis};
pub use room::{Player, Room};
