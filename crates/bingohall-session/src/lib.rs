//! Connection sessions for Bingohall.
//!
//! A session is the server's record of one live socket: who it is
//! ([`ConnectionId`](bingohall_transport::ConnectionId)), when it arrived,
//! and the queue its writer task drains. Room membership lives one layer
//! up; this crate only knows who is connected and how to reach them.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← decides who should hear what
//!     ↕
//! Session Layer (this crate)  ← maps connections to outbound queues
//!     ↕
//! Transport Layer (below)  ← provides ConnectionId
//! ```

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{Outbound, OutboundReceiver, OutboundSender, Session, outbound_channel};
