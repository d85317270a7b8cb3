//! Room and match views that travel on the wire.
//!
//! These are read models: they are built from authoritative state by the
//! room crate and never fed back into it. Field names are camelCase on the
//! wire because the clients are JavaScript.

use std::fmt;

use domino_engine::{Board, RoundReason, Seat, Team, Tile};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A room identifier, chosen by the client that creates the room.
///
/// Newtype over `String` so a room id can't be confused with a player
/// name. `#[serde(transparent)]` keeps it a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ---------------------------------------------------------------------------
// Room lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle state of a room.
///
/// ```text
/// waiting ──start (4 players)──→ playing ──target reached──→ finished
///                                  ↺ restart round
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomState {
    /// Gathering players. The only state that accepts joins.
    #[default]
    Waiting,
    /// A match is running.
    Playing,
    /// A team reached the target score.
    Finished,
}

impl RoomState {
    pub fn is_joinable(self) -> bool {
        self == RoomState::Waiting
    }

    pub fn is_playing(self) -> bool {
        self == RoomState::Playing
    }
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomState::Waiting => write!(f, "waiting"),
            RoomState::Playing => write!(f, "playing"),
            RoomState::Finished => write!(f, "finished"),
        }
    }
}

/// Public summary of a room. Reveals no tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub player_count: usize,
    pub max_players: usize,
    pub state: RoomState,
    /// Member names in join order.
    pub players: Vec<String>,
    pub host_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Per-viewer match snapshot
// ---------------------------------------------------------------------------

/// One seat as seen by a particular viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub seat: Seat,
    pub name: String,
    pub team: Team,
    pub tile_count: usize,
    /// Tiles in this seat's hand. Present only on the viewer's own seat.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand: Option<Vec<Tile>>,
    /// `false` once the seat's player has left mid-match.
    pub connected: bool,
}

/// The match as one viewer is allowed to see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub room_id: RoomId,
    pub state: RoomState,
    pub board: Board,
    /// Cumulative points, indexed by team (A, B).
    pub scores: [u32; 2],
    pub team_names: [String; 2],
    pub current_seat: Seat,
    /// The viewer's own seat; `None` for a connection without one.
    pub my_seat: Option<Seat>,
    pub seats: Vec<SeatView>,
    /// Size of the standby pile. Its contents are never sent.
    pub standby_count: usize,
    pub target_score: u32,
    pub round: u32,
    pub consecutive_passes: u8,
    pub is_round_over: bool,
    pub is_match_over: bool,
}

impl GameSnapshot {
    /// The viewer's own hand, if the viewer holds a seat.
    pub fn my_hand(&self) -> Option<&[Tile]> {
        let seat = self.my_seat?;
        self.seats
            .iter()
            .find(|s| s.seat == seat)
            .and_then(|s| s.hand.as_deref())
    }
}

/// Who has to open the round, attached to `gameStarted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstMove {
    pub seat: Seat,
    pub player_name: String,
    /// Where the opening double sits in the opener's hand. `None` when
    /// nobody holds a double.
    pub hand_index: Option<usize>,
    pub tile: Option<Tile>,
}

/// How a round was decided, attached to `roundEnded`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerInfo {
    pub team: Team,
    pub team_name: String,
    pub reason: RoundReason,
    /// The seat that went out. Only set for a batida.
    pub seat: Option<Seat>,
    pub player_name: Option<String>,
    /// Pips left in each team's hands when the round ended.
    pub team_pips: [u32; 2],
    pub match_over: bool,
}
