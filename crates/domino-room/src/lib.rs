//! Rooms for the domino server.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! roster and its match. The coordinator maps ids and connections to
//! those tasks.
//!
//! # Key types
//!
//! - [`Room`]: roster, host, lifecycle state, and the owned match
//! - [`RoomCoordinator`]: creates/destroys rooms, routes connections
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`view::project`]: the per-viewer snapshot, hiding other hands
//! - [`RoomConfig`]: name limits, channel size, match rules

mod actor;
mod config;
mod coordinator;
mod error;
mod room;
pub mod view;

pub use actor::{LeaveOutcome, PlayerSender, RoomHandle};
pub use config::{ROOM_CAPACITY, RoomConfig};
pub use coordinator::RoomCoordinator;
pub use error::RoomError;
pub use room::{Member, MoveOutcome, Room};
