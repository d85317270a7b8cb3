//! # domino-server
//!
//! Authoritative server for four-player partnership dominoes over
//! WebSockets.
//!
//! Clients send bare JSON [`ClientEvent`](domino_protocol::ClientEvent)s;
//! the server answers with [`Envelope`](domino_protocol::Envelope)-wrapped
//! [`ServerEvent`](domino_protocol::ServerEvent)s. Every room runs in its
//! own actor, and every snapshot a client receives shows only that
//! client's hand.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domino_server::prelude::*;
//!
//! # async fn run() -> Result<(), DominoError> {
//! let config = ServerConfig::from_env()?;
//! let server = DominoServer::builder().config(&config).build().await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::DominoError;
pub use server::{DominoServer, DominoServerBuilder};

/// Everything needed to configure and run a server, plus the wire types
/// clients exchange with it.
pub mod prelude {
    pub use crate::{DominoError, DominoServer, DominoServerBuilder, ServerConfig};
    pub use domino_engine::{MatchConfig, Side, Tile};
    pub use domino_protocol::{ClientEvent, Envelope, RoomId, ServerEvent};
    pub use domino_room::RoomConfig;
}
