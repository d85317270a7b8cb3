//! Per-connection handler: event routing and outbound delivery.
//!
//! Each accepted connection gets two tasks:
//!   1. a writer that drains the connection's outbound channel, wraps each
//!      event in an [`Envelope`] and sends it
//!   2. this handler, which reads frames, decodes [`ClientEvent`]s and
//!      dispatches them to the room coordinator
//!
//! Room actors and the handler push into the same channel, so `seq` is
//! assigned in exactly the order events reach the wire.

use std::sync::Arc;
use std::time::{Duration, Instant};

use domino_protocol::{ClientEvent, Codec, Envelope, ServerEvent};
use domino_room::{PlayerSender, RoomError};
use domino_transport::{Connection, ConnectionId, TransportError, WebSocketConnection};
use tokio::sync::mpsc;

use crate::DominoError;
use crate::server::ServerState;

/// Drop guard that takes the connection out of its room when the handler
/// exits.
///
/// `Drop` is synchronous, so the async leave runs in a spawned task.
struct MembershipGuard<C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for MembershipGuard<C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            match state.rooms.leave_room(conn_id).await {
                Ok(()) | Err(RoomError::PlayerNotInRoom) => {}
                Err(e) => tracing::warn!(%conn_id, error = %e, "leave on disconnect failed"),
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), DominoError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let start = Instant::now();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_loop(Arc::clone(&conn), Arc::clone(&state), rx, start));
    let guard = MembershipGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    let result = read_loop(&conn, &state, &tx, start).await;

    drop(guard);
    writer.abort();
    let _ = conn.close().await;
    result
}

async fn read_loop<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    tx: &PlayerSender,
    start: Instant,
) -> Result<(), DominoError> {
    let conn_id = conn.id();

    loop {
        let received = match state.idle_timeout {
            Some(limit) => match recv_within(conn, limit).await {
                Some(received) => received,
                None => {
                    tracing::info!(%conn_id, "connection idle, closing");
                    return Ok(());
                }
            },
            None => conn.recv().await,
        };

        let data = match received {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                return Ok(());
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                return Err(e.into());
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode client event");
                reply(
                    tx,
                    ServerEvent::Error {
                        code: 400,
                        message: format!("malformed request: {e}"),
                    },
                );
                continue;
            }
        };

        dispatch(state, conn_id, event, tx, start).await;
    }
}

/// Waits for the next data frame, as long as the peer keeps sending
/// something (keepalive pings included) at least every `limit`. `None`
/// once the peer has been silent for a full `limit`.
async fn recv_within(
    conn: &WebSocketConnection,
    limit: Duration,
) -> Option<Result<Option<Vec<u8>>, TransportError>> {
    loop {
        let remaining = limit.saturating_sub(conn.idle_for());
        if remaining.is_zero() {
            return None;
        }
        if let Ok(received) = tokio::time::timeout(remaining, conn.recv()).await {
            return Some(received);
        }
    }
}

/// Routes one event. Rejections go back to this connection only.
async fn dispatch<C: Codec>(
    state: &ServerState<C>,
    conn_id: ConnectionId,
    event: ClientEvent,
    tx: &PlayerSender,
    start: Instant,
) {
    let kind = event.kind();
    let rooms = &state.rooms;

    let result = match event {
        ClientEvent::CreateRoom { room_id, player_name } => rooms
            .create_room(conn_id, room_id, &player_name, tx.clone())
            .await
            .map(|_| ()),
        ClientEvent::JoinRoom { room_id, player_name } => rooms
            .join_room(conn_id, room_id, &player_name, tx.clone())
            .await
            .map(|_| ()),
        ClientEvent::LeaveRoom => rooms.leave_room(conn_id).await,
        ClientEvent::StartGame => rooms.start_game(conn_id).await,
        ClientEvent::MakeMove { hand_index, side } => {
            rooms.make_move(conn_id, hand_index, side).await.map(|_| ())
        }
        ClientEvent::PassTurn => rooms.pass_turn(conn_id).await.map(|_| ()),
        ClientEvent::RestartGame => rooms.restart_game(conn_id).await,
        ClientEvent::ListRooms => {
            let summaries = rooms.list_rooms().await;
            reply(tx, ServerEvent::RoomList { rooms: summaries });
            Ok(())
        }
        ClientEvent::Ping { client_time } => {
            reply(
                tx,
                ServerEvent::Pong {
                    client_time,
                    server_time: elapsed_ms(start),
                },
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        tracing::debug!(%conn_id, request = kind, error = %e, "request rejected");
        reply(
            tx,
            ServerEvent::Error {
                code: e.code(),
                message: e.to_string(),
            },
        );
    }
}

/// Drains outbound events onto the wire until the channel closes or a
/// send fails.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
    start: Instant,
) {
    let conn_id = conn.id();
    let mut seq: u64 = 1;

    while let Some(event) = rx.recv().await {
        let envelope = Envelope {
            seq: next_seq(&mut seq),
            timestamp: elapsed_ms(start),
            event,
        };
        let bytes = match state.codec.encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "failed to encode server event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
            break;
        }
        tracing::trace!(
            %conn_id,
            seq = envelope.seq,
            round = envelope.event.snapshot().map(|s| s.round),
            "event sent"
        );
    }
}

/// Queues an event for this connection. A closed channel means the writer
/// is gone, and so is the client.
fn reply(tx: &PlayerSender, event: ServerEvent) {
    let _ = tx.send(event);
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_seq_starts_at_current_and_increments() {
        let mut seq = 1;
        assert_eq!(next_seq(&mut seq), 1);
        assert_eq!(next_seq(&mut seq), 2);
        assert_eq!(seq, 3);
    }

    #[test]
    fn test_reply_to_closed_channel_is_silent() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        reply(&tx, ServerEvent::RoomList { rooms: vec![] });
    }
}
