//! Authoritative rules for four-player partnership dominoes.
//!
//! This crate knows nothing about rooms, connections, or the network. It
//! owns the pieces of state that have real invariants:
//!
//! - **Tiles** ([`Tile`], [`PlacedTile`]): the 28 unique pip pairs
//! - **Hands** ([`Hand`]) and the **deal** ([`Deal`]) that fills them
//! - **Board** ([`Board`]): the chain of played tiles with two open ends
//! - **Match** ([`Match`]): turn order, move legality, round and match
//!   termination, and cumulative team scores
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← owns one Match per room, maps connections to seats
//!     ↕
//! Engine (this crate)  ← pure state transitions, no I/O
//! ```
//!
//! Every mutating operation validates first and mutates second, so a
//! rejected call leaves the match exactly as it was.

mod board;
mod config;
mod deal;
mod engine;
mod error;
mod hand;
mod seat;
mod tile;

pub use board::{Board, Playability, Side};
pub use config::MatchConfig;
pub use deal::Deal;
pub use engine::{Match, Opener, Player, RoundReason, RoundResult};
pub use error::EngineError;
pub use hand::Hand;
pub use seat::{Seat, Team, SEATS};
pub use tile::{FULL_SET_SIZE, MAX_PIP, PlacedTile, Tile, full_set};
