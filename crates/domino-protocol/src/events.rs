//! Events exchanged between clients and the server.
//!
//! Both directions use "internally tagged" JSON: the variant name sits in a
//! `type` field next to the payload fields.
//!
//! ```text
//! {"type":"makeMove","handIndex":2,"side":"left"}
//! ```

use domino_engine::Side;
use serde::{Deserialize, Serialize};

use crate::{FirstMove, GameSnapshot, RoomId, RoomSummary, WinnerInfo};

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Everything a client can ask for. Inbound frames are bare `ClientEvent`s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Open a new room and become its host.
    CreateRoom { room_id: RoomId, player_name: String },

    /// Join an existing room that hasn't started yet.
    JoinRoom { room_id: RoomId, player_name: String },

    /// Leave the current room. Same effect as disconnecting.
    LeaveRoom,

    /// Host only: deal and start the match.
    StartGame,

    /// Play the tile at `hand_index` onto `side` of the board.
    MakeMove { hand_index: usize, side: Side },

    /// Pass the turn.
    PassTurn,

    /// Host only: deal a new round, keeping the scores.
    RestartGame,

    /// Public summaries of every active room.
    ListRooms,

    /// Keep-alive. Answered with [`ServerEvent::Pong`].
    Ping { client_time: u64 },
}

impl ClientEvent {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientEvent::CreateRoom { .. } => "createRoom",
            ClientEvent::JoinRoom { .. } => "joinRoom",
            ClientEvent::LeaveRoom => "leaveRoom",
            ClientEvent::StartGame => "startGame",
            ClientEvent::MakeMove { .. } => "makeMove",
            ClientEvent::PassTurn => "passTurn",
            ClientEvent::RestartGame => "restartGame",
            ClientEvent::ListRooms => "listRooms",
            ClientEvent::Ping { .. } => "ping",
        }
    }
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Everything the server can send.
///
/// Events carrying a [`GameSnapshot`] are built separately for every
/// recipient, so each copy holds only that recipient's hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Sent to the creator only.
    RoomCreated { room: RoomSummary },

    /// Broadcast to every member, the newcomer included.
    PlayerJoined { player_name: String, room: RoomSummary },

    /// A round was dealt, either at match start or on restart.
    GameStarted {
        snapshot: GameSnapshot,
        first_move: FirstMove,
    },

    /// A move or pass was accepted and the round goes on.
    GameUpdate { snapshot: GameSnapshot },

    /// A move or pass ended the round.
    RoundEnded {
        snapshot: GameSnapshot,
        winner_info: WinnerInfo,
    },

    /// Broadcast to the remaining members.
    PlayerLeft { player_name: String, room: RoomSummary },

    /// Reply to [`ClientEvent::ListRooms`].
    RoomList { rooms: Vec<RoomSummary> },

    /// Reply to [`ClientEvent::Ping`].
    Pong { client_time: u64, server_time: u64 },

    /// A request was rejected. Sent only to the connection that made it.
    /// `code` follows HTTP conventions (400, 403, 404, 409, ...).
    Error { code: u16, message: String },
}

impl ServerEvent {
    /// The snapshot carried by this event, if any.
    pub fn snapshot(&self) -> Option<&GameSnapshot> {
        match self {
            ServerEvent::GameStarted { snapshot, .. }
            | ServerEvent::GameUpdate { snapshot }
            | ServerEvent::RoundEnded { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Wrapper around every outbound event.
///
/// ```text
/// ┌──────────────────────────────┐
/// │ seq: 42                      │  ← per-connection counter
/// │ timestamp: 15000             │  ← ms since the connection opened
/// │ ┌──────────────────────────┐ │
/// │ │ event: {"type": ...}     │ │
/// │ └──────────────────────────┘ │
/// └──────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Starts at 1 and increments for every event sent on one connection.
    /// A gap means the client missed something.
    pub seq: u64,
    pub timestamp: u64,
    pub event: ServerEvent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RoomState;
    use serde_json::json;

    #[test]
    fn test_make_move_wire_format() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"makeMove","handIndex":2,"side":"left"}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::MakeMove {
                hand_index: 2,
                side: Side::Left
            }
        );
    }

    #[test]
    fn test_create_room_wire_format() {
        let event: ClientEvent = serde_json::from_value(json!({
            "type": "createRoom",
            "roomId": "mesa",
            "playerName": "ana"
        }))
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::CreateRoom {
                room_id: RoomId::new("mesa"),
                player_name: "ana".into()
            }
        );
        assert_eq!(event.kind(), "createRoom");
    }

    #[test]
    fn test_unit_events_need_only_type() {
        for (raw, expected) in [
            (r#"{"type":"startGame"}"#, ClientEvent::StartGame),
            (r#"{"type":"passTurn"}"#, ClientEvent::PassTurn),
            (r#"{"type":"restartGame"}"#, ClientEvent::RestartGame),
            (r#"{"type":"listRooms"}"#, ClientEvent::ListRooms),
            (r#"{"type":"leaveRoom"}"#, ClientEvent::LeaveRoom),
        ] {
            assert_eq!(serde_json::from_str::<ClientEvent>(raw).unwrap(), expected);
        }
    }

    #[test]
    fn test_make_move_rejects_unknown_side() {
        let result =
            serde_json::from_str::<ClientEvent>(r#"{"type":"makeMove","handIndex":0,"side":"up"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_error_event_json_format() {
        let event = ServerEvent::Error {
            code: 403,
            message: "only the host can start the game".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], 403);
        assert!(event.snapshot().is_none());
    }

    #[test]
    fn test_player_joined_json_format() {
        let event = ServerEvent::PlayerJoined {
            player_name: "bruno".into(),
            room: RoomSummary {
                room_id: RoomId::new("mesa"),
                player_count: 2,
                max_players: 4,
                state: RoomState::Waiting,
                players: vec!["ana".into(), "bruno".into()],
                host_name: Some("ana".into()),
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "playerJoined");
        assert_eq!(json["playerName"], "bruno");
        assert_eq!(json["room"]["playerCount"], 2);
    }

    #[test]
    fn test_envelope_nests_event() {
        let envelope = Envelope {
            seq: 1,
            timestamp: 0,
            event: ServerEvent::Pong {
                client_time: 5,
                server_time: 9,
            },
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            json,
            json!({
                "seq": 1,
                "timestamp": 0,
                "event": {"type": "pong", "clientTime": 5, "serverTime": 9}
            })
        );
    }
}
