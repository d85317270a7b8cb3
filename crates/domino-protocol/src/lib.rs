//! Wire protocol for the domino server.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Types** ([`RoomId`], [`RoomState`], [`RoomSummary`], [`GameSnapshot`])
//!   describe rooms and the per-viewer view of a match.
//! - **Events** ([`ClientEvent`], [`ServerEvent`], [`Envelope`]) are what
//!   actually travels on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) converts events to and from
//!   bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (frames) → Protocol (ClientEvent) → Room coordinator
//! Room actor (ServerEvent) → Protocol (Envelope) → Transport (frames)
//! ```
//!
//! Nothing in this crate can express another player's hand. A
//! [`GameSnapshot`] only has room for the viewer's own tiles.

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ClientEvent, Envelope, ServerEvent};
pub use types::{FirstMove, GameSnapshot, RoomId, RoomState, RoomSummary, SeatView, WinnerInfo};
