//! Room coordinator: creates rooms, tracks memberships, routes requests.
//!
//! Two lookup tables, each behind its own [`tokio::sync::RwLock`]:
//!
//! - `rooms`: room id → handle of the actor that owns the room
//! - `memberships`: connection → the one room it belongs to
//!
//! Locks are only held to read or update a table, never across a request
//! to a room actor. The actor serializes everything that touches one room,
//! so the coordinator itself never mutates room state.

use std::collections::HashMap;

use domino_engine::Side;
use domino_protocol::{GameSnapshot, RoomId, RoomSummary};
use domino_transport::ConnectionId;
use tokio::sync::RwLock;

use crate::actor::{RoomHandle, spawn_room};
use crate::room::MoveOutcome;
use crate::{PlayerSender, Room, RoomConfig, RoomError};

/// Process-wide registry of rooms. One per server, shared behind an `Arc`.
pub struct RoomCoordinator {
    config: RoomConfig,
    rooms: RwLock<HashMap<RoomId, RoomHandle>>,
    /// A connection is in at most ONE room at a time.
    memberships: RwLock<HashMap<ConnectionId, RoomId>>,
}

impl RoomCoordinator {
    /// Creates a new, empty coordinator.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            rooms: RwLock::new(HashMap::new()),
            memberships: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Creates a room with `conn` as host and spawns its actor.
    ///
    /// The host's `sender` receives `roomCreated` first.
    ///
    /// # Errors
    /// [`RoomError::AlreadyInRoom`], [`RoomError::InvalidRequest`] for a
    /// bad id or name, or [`RoomError::RoomAlreadyExists`].
    pub async fn create_room(
        &self,
        conn: ConnectionId,
        room_id: RoomId,
        player_name: &str,
        sender: PlayerSender,
    ) -> Result<RoomSummary, RoomError> {
        self.ensure_roomless(conn).await?;
        let room = Room::new(room_id, conn, player_name, self.config.clone())?;
        let room_id = room.id().clone();
        let summary = room.summary();

        {
            let mut rooms = self.rooms.write().await;
            match rooms.get(&room_id) {
                Some(existing) if !existing.is_closed() => {
                    return Err(RoomError::RoomAlreadyExists(room_id));
                }
                // The actor stopped but nobody purged it yet. Its members
                // must not end up routed to the new room.
                Some(_) => {
                    self.memberships.write().await.retain(|_, rid| *rid != room_id);
                    tracing::warn!(%room_id, "stale room purged");
                }
                None => {}
            }
            let handle = spawn_room(room, sender, self.config.channel_size);
            rooms.insert(room_id.clone(), handle);
        }
        self.memberships.write().await.insert(conn, room_id.clone());

        tracing::info!(%room_id, %conn, host = %player_name.trim(), "room created");
        Ok(summary)
    }

    /// Adds `conn` to a waiting room. Every member, the newcomer included,
    /// receives `playerJoined`.
    ///
    /// # Errors
    /// [`RoomError::AlreadyInRoom`], [`RoomError::RoomNotFound`], or any
    /// rejection from [`Room::add_player`].
    pub async fn join_room(
        &self,
        conn: ConnectionId,
        room_id: RoomId,
        player_name: &str,
        sender: PlayerSender,
    ) -> Result<RoomSummary, RoomError> {
        self.ensure_roomless(conn).await?;
        let handle = self
            .rooms
            .read()
            .await
            .get(&room_id)
            .cloned()
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;

        match handle.join(conn, player_name.to_string(), sender).await {
            Ok(summary) => {
                self.memberships.write().await.insert(conn, room_id);
                Ok(summary)
            }
            // The actor stopped between lookup and join: the room emptied.
            Err(RoomError::Unavailable(_)) => {
                self.purge(&handle).await;
                Err(RoomError::RoomNotFound(room_id))
            }
            Err(e) => Err(e),
        }
    }

    /// Removes `conn` from its room. Remaining members receive
    /// `playerLeft`; an emptied room is destroyed.
    ///
    /// # Errors
    /// [`RoomError::PlayerNotInRoom`] if `conn` is in no room.
    pub async fn leave_room(&self, conn: ConnectionId) -> Result<(), RoomError> {
        let room_id = self
            .memberships
            .write()
            .await
            .remove(&conn)
            .ok_or(RoomError::PlayerNotInRoom)?;

        let Some(handle) = self.rooms.read().await.get(&room_id).cloned() else {
            return Ok(());
        };

        match handle.leave(conn).await {
            Ok(outcome) if outcome.room_empty => {
                self.remove_room(&handle).await;
                tracing::info!(%room_id, "room destroyed");
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(e) if e.is_fatal() => {
                self.purge(&handle).await;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    // -----------------------------------------------------------------------
    // Game requests
    // -----------------------------------------------------------------------

    /// Host only: starts the match in the caller's room.
    pub async fn start_game(&self, conn: ConnectionId) -> Result<(), RoomError> {
        let handle = self.handle_for(conn).await?;
        let result = handle.start(conn).await;
        self.settle(&handle, result).await
    }

    /// Plays a tile for the caller's seat.
    pub async fn make_move(
        &self,
        conn: ConnectionId,
        hand_index: usize,
        side: Side,
    ) -> Result<MoveOutcome, RoomError> {
        let handle = self.handle_for(conn).await?;
        let result = handle.play(conn, hand_index, side).await;
        self.settle(&handle, result).await
    }

    /// Passes for the caller's seat.
    pub async fn pass_turn(&self, conn: ConnectionId) -> Result<MoveOutcome, RoomError> {
        let handle = self.handle_for(conn).await?;
        let result = handle.pass(conn).await;
        self.settle(&handle, result).await
    }

    /// Host only: deals a new round, keeping the scores.
    pub async fn restart_game(&self, conn: ConnectionId) -> Result<(), RoomError> {
        let handle = self.handle_for(conn).await?;
        let result = handle.restart(conn).await;
        self.settle(&handle, result).await
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Public summaries of every live room, ordered by id.
    ///
    /// Rooms that fail to answer (shutting down) are skipped.
    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        let handles: Vec<RoomHandle> = self.rooms.read().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in &handles {
            if let Ok(summary) = handle.summary().await {
                summaries.push(summary);
            }
        }
        summaries.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        summaries
    }

    /// The snapshot `conn` currently sees. `None` before the match starts.
    pub async fn snapshot(&self, conn: ConnectionId) -> Result<Option<GameSnapshot>, RoomError> {
        let handle = self.handle_for(conn).await?;
        let result = handle.snapshot(conn).await;
        self.settle(&handle, result).await
    }

    /// The room `conn` belongs to, if any.
    pub async fn room_of(&self, conn: ConnectionId) -> Option<RoomId> {
        self.memberships.read().await.get(&conn).cloned()
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Stops every room actor and clears both tables.
    pub async fn shutdown(&self) {
        let handles: Vec<RoomHandle> = self.rooms.write().await.drain().map(|(_, h)| h).collect();
        self.memberships.write().await.clear();
        for handle in handles {
            let _ = handle.shutdown().await;
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn ensure_roomless(&self, conn: ConnectionId) -> Result<(), RoomError> {
        match self.memberships.read().await.get(&conn) {
            Some(current) => Err(RoomError::AlreadyInRoom(current.clone())),
            None => Ok(()),
        }
    }

    async fn handle_for(&self, conn: ConnectionId) -> Result<RoomHandle, RoomError> {
        let room_id = self
            .memberships
            .read()
            .await
            .get(&conn)
            .cloned()
            .ok_or(RoomError::PlayerNotInRoom)?;
        self.rooms
            .read()
            .await
            .get(&room_id)
            .cloned()
            .ok_or(RoomError::RoomNotFound(room_id))
    }

    /// Passes `result` through, dropping the room first if it reports the
    /// actor gone or broken.
    async fn settle<T>(&self, handle: &RoomHandle, result: Result<T, RoomError>) -> Result<T, RoomError> {
        if let Err(e) = &result {
            if e.is_fatal() {
                self.purge(handle).await;
            }
        }
        result
    }

    /// Removes a dead room and every membership pointing at it.
    async fn purge(&self, handle: &RoomHandle) {
        if self.remove_room(handle).await {
            let room_id = handle.room_id();
            self.memberships.write().await.retain(|_, rid| rid != room_id);
            tracing::warn!(%room_id, "room purged");
        }
    }

    /// Removes `handle`'s room from the table, unless the id has already
    /// been reused by a newer room. Returns whether anything was removed.
    async fn remove_room(&self, handle: &RoomHandle) -> bool {
        let mut rooms = self.rooms.write().await;
        let current = rooms.get(handle.room_id()).is_some_and(|h| h.same_room(handle));
        if current {
            rooms.remove(handle.room_id());
        }
        current
    }
}

impl Default for RoomCoordinator {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use domino_protocol::ServerEvent;
    use tokio::sync::mpsc;

    use super::*;

    struct Player {
        conn: ConnectionId,
        rx: mpsc::UnboundedReceiver<ServerEvent>,
        tx: PlayerSender,
    }

    fn player(id: u64) -> Player {
        let (tx, rx) = mpsc::unbounded_channel();
        Player {
            conn: ConnectionId::new(id),
            rx,
            tx,
        }
    }

    impl Player {
        fn drain(&mut self) -> Vec<ServerEvent> {
            let mut events = Vec::new();
            while let Ok(event) = self.rx.try_recv() {
                events.push(event);
            }
            events
        }
    }

    /// Four players seated in `room_id` with the match started.
    async fn started_table(coord: &RoomCoordinator, room_id: &str, first_id: u64) -> Vec<Player> {
        let mut players: Vec<Player> = (first_id..first_id + 4).map(player).collect();
        coord
            .create_room(players[0].conn, RoomId::new(room_id), "ana", players[0].tx.clone())
            .await
            .unwrap();
        for (p, name) in players.iter().zip(["ana", "bruno", "carla", "davi"]).skip(1) {
            coord
                .join_room(p.conn, RoomId::new(room_id), name, p.tx.clone())
                .await
                .unwrap();
        }
        coord.start_game(players[0].conn).await.unwrap();
        for p in &mut players {
            p.drain();
        }
        players
    }

    /// Index of the player whose turn it is. Seats follow join order.
    async fn current_mover(coord: &RoomCoordinator, players: &[Player]) -> usize {
        let snapshot = coord.snapshot(players[0].conn).await.unwrap().unwrap();
        snapshot.current_seat.index()
    }

    async fn wait_closed(handle: &RoomHandle) {
        tokio::time::timeout(Duration::from_secs(1), async {
            while !handle.is_closed() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("room actor should stop");
    }

    #[tokio::test]
    async fn test_broken_room_is_closed_and_purged_alone() {
        let coord = RoomCoordinator::default();
        let mut broken = started_table(&coord, "mesa", 1).await;
        let mut healthy = started_table(&coord, "outra", 11).await;

        let handle = coord.handle_for(broken[0].conn).await.unwrap();
        handle.corrupt().await.unwrap();

        let mover = current_mover(&coord, &broken).await;
        let err = coord.pass_turn(broken[mover].conn).await.unwrap_err();
        assert!(matches!(err, RoomError::Invariant(_)));
        assert_eq!(err.code(), 500);

        for p in &mut broken {
            match p.drain().as_slice() {
                [ServerEvent::Error { code: 500, .. }] => {}
                other => panic!("expected one internal error event, got {other:?}"),
            }
            assert_eq!(coord.room_of(p.conn).await, None);
        }
        wait_closed(&handle).await;
        assert_eq!(coord.room_count().await, 1);

        // The other room never noticed.
        let mover = current_mover(&coord, &healthy).await;
        assert_eq!(coord.pass_turn(healthy[mover].conn).await.unwrap(), MoveOutcome::Continued);
        for p in &mut healthy {
            assert!(matches!(p.drain().as_slice(), [ServerEvent::GameUpdate { .. }]));
        }

        // And the broken room's players are free to start over.
        coord
            .create_room(broken[0].conn, RoomId::new("mesa"), "ana", broken[0].tx.clone())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_over_stopped_room_drops_its_memberships() {
        let coord = RoomCoordinator::default();
        let old_host = player(1);
        let guest = player(2);
        coord
            .create_room(old_host.conn, RoomId::new("mesa"), "ana", old_host.tx.clone())
            .await
            .unwrap();
        coord
            .join_room(guest.conn, RoomId::new("mesa"), "bruno", guest.tx.clone())
            .await
            .unwrap();

        // Stop the actor behind the coordinator's back.
        let stale = coord.handle_for(old_host.conn).await.unwrap();
        stale.shutdown().await.unwrap();
        wait_closed(&stale).await;

        let new_host = player(3);
        coord
            .create_room(new_host.conn, RoomId::new("mesa"), "carla", new_host.tx.clone())
            .await
            .unwrap();

        assert_eq!(coord.room_of(old_host.conn).await, None);
        assert_eq!(coord.room_of(guest.conn).await, None);
        assert_eq!(coord.room_of(new_host.conn).await, Some(RoomId::new("mesa")));

        // Stale members are neither routed to the new room nor stuck.
        assert!(matches!(coord.start_game(guest.conn).await, Err(RoomError::PlayerNotInRoom)));
        coord
            .join_room(guest.conn, RoomId::new("mesa"), "bruno", guest.tx.clone())
            .await
            .unwrap();
    }
}
