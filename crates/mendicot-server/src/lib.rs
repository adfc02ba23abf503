//! Mendicot multiplayer game server.
//!
//! - [`config`]: Environment configuration
//! - [`protocol`]: Wire messages
//! - [`session`]: Seats, lobby and per-table game ownership
//! - [`sync`]: Event ordering and the viewer-side reducer
//! - [`server`]: WebSocket transport and the session registry

pub mod config;
pub mod protocol;
pub mod server;
pub mod session;
pub mod sync;

pub use config::{ConfigError, ServerConfig};
pub use protocol::{ClientMessage, JoinRequest, OutcomeKind, ServerMessage};
pub use server::{run_server, serve, ServerState};
pub use session::{Outbound, Recipient, Session, SessionError, SessionStatus};
pub use sync::{play_messages, TableView};
