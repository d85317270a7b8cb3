//! Per-viewer projection of a room's match.
//!
//! This is the only place a [`GameSnapshot`] is built, and the only code
//! that reads hand contents on their way out. A viewer gets tile values
//! for their own seat and a tile count for every other seat.

use domino_engine::{Opener, RoundResult, Seat};
use domino_protocol::{FirstMove, GameSnapshot, SeatView, WinnerInfo};
use domino_transport::ConnectionId;

use crate::Room;

/// Builds the snapshot `viewer` is allowed to see. `None` before a match
/// has been dealt.
pub fn project(room: &Room, viewer: ConnectionId) -> Option<GameSnapshot> {
    let game = room.game()?;
    let my_seat = room.seat_of(viewer);

    let seats = Seat::all()
        .map(|seat| {
            let player = game.player(seat);
            SeatView {
                seat,
                name: player.name.clone(),
                team: seat.team(),
                tile_count: player.hand.len(),
                hand: (my_seat == Some(seat)).then(|| player.hand.tiles().to_vec()),
                connected: room.member_at(seat).is_some(),
            }
        })
        .collect();

    Some(GameSnapshot {
        room_id: room.id().clone(),
        state: room.state(),
        board: game.board().clone(),
        scores: game.scores(),
        team_names: game.team_names(),
        current_seat: game.current_seat(),
        my_seat,
        seats,
        standby_count: game.standby().len(),
        target_score: game.config().target_score,
        round: game.round_number(),
        consecutive_passes: game.consecutive_passes(),
        is_round_over: game.is_round_over(),
        is_match_over: game.is_match_over(),
    })
}

/// Describes the opener for the `gameStarted` event.
pub fn first_move(room: &Room, opener: &Opener) -> FirstMove {
    FirstMove {
        seat: opener.seat,
        player_name: seat_name(room, opener.seat),
        hand_index: opener.hand_index,
        tile: opener.tile,
    }
}

/// Describes a finished round for the `roundEnded` event.
pub fn winner_info(room: &Room, result: &RoundResult, match_over: bool) -> WinnerInfo {
    let team_name = room
        .game()
        .map(|g| g.team_names()[result.team.index()].clone())
        .unwrap_or_else(|| result.team.to_string());

    WinnerInfo {
        team: result.team,
        team_name,
        reason: result.reason,
        seat: result.seat,
        player_name: result.seat.map(|seat| seat_name(room, seat)),
        team_pips: result.team_pips,
        match_over,
    }
}

fn seat_name(room: &Room, seat: Seat) -> String {
    room.game()
        .map(|g| g.player(seat).name.clone())
        .unwrap_or_default()
}
