//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! Each room runs in its own task and is reached only through an mpsc
//! channel. Commands are handled one at a time, so there is never more
//! than one mutation of a room in flight, while separate rooms run fully
//! in parallel.
//!
//! After every accepted command the actor pushes the resulting events to
//! the members' outbound channels. Game state goes out through
//! [`view::project`] only, one snapshot per recipient.

use std::collections::HashMap;

use domino_engine::{Opener, Side};
use domino_protocol::{GameSnapshot, RoomId, RoomSummary, ServerEvent};
use domino_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::room::MoveOutcome;
use crate::{Room, RoomError, view};

/// Channel sender for delivering outbound events to one connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

type Reply<T> = oneshot::Sender<Result<T, RoomError>>;

/// Commands sent to a room actor through its channel.
///
/// Variants carrying a `reply` are request/response: the caller waits on
/// the oneshot for the outcome.
pub(crate) enum RoomCommand {
    Join {
        conn: ConnectionId,
        name: String,
        sender: PlayerSender,
        reply: Reply<RoomSummary>,
    },
    Leave {
        conn: ConnectionId,
        reply: Reply<LeaveOutcome>,
    },
    Start {
        conn: ConnectionId,
        reply: Reply<()>,
    },
    Move {
        conn: ConnectionId,
        hand_index: usize,
        side: Side,
        reply: Reply<MoveOutcome>,
    },
    Pass {
        conn: ConnectionId,
        reply: Reply<MoveOutcome>,
    },
    Restart {
        conn: ConnectionId,
        reply: Reply<()>,
    },
    Summary {
        reply: oneshot::Sender<RoomSummary>,
    },
    Snapshot {
        conn: ConnectionId,
        reply: oneshot::Sender<Option<GameSnapshot>>,
    },
    Shutdown,
    #[cfg(test)]
    Corrupt { reply: oneshot::Sender<()> },
}

/// Result of a successful leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// The last member left; the actor has stopped.
    pub room_empty: bool,
}

/// Handle to a running room actor. Cheap to clone: it's just an
/// `mpsc::Sender` plus the room id.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// `true` if both handles reach the same actor.
    pub fn same_room(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    pub(crate) async fn join(
        &self,
        conn: ConnectionId,
        name: String,
        sender: PlayerSender,
    ) -> Result<RoomSummary, RoomError> {
        self.request(|reply| RoomCommand::Join {
            conn,
            name,
            sender,
            reply,
        })
        .await?
    }

    pub(crate) async fn leave(&self, conn: ConnectionId) -> Result<LeaveOutcome, RoomError> {
        self.request(|reply| RoomCommand::Leave { conn, reply }).await?
    }

    pub(crate) async fn start(&self, conn: ConnectionId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Start { conn, reply }).await?
    }

    pub(crate) async fn play(
        &self,
        conn: ConnectionId,
        hand_index: usize,
        side: Side,
    ) -> Result<MoveOutcome, RoomError> {
        self.request(|reply| RoomCommand::Move {
            conn,
            hand_index,
            side,
            reply,
        })
        .await?
    }

    pub(crate) async fn pass(&self, conn: ConnectionId) -> Result<MoveOutcome, RoomError> {
        self.request(|reply| RoomCommand::Pass { conn, reply }).await?
    }

    pub(crate) async fn restart(&self, conn: ConnectionId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Restart { conn, reply }).await?
    }

    /// Requests the room's public summary.
    pub async fn summary(&self) -> Result<RoomSummary, RoomError> {
        self.request(|reply| RoomCommand::Summary { reply }).await
    }

    /// Requests the snapshot `conn` would see right now.
    pub async fn snapshot(&self, conn: ConnectionId) -> Result<Option<GameSnapshot>, RoomError> {
        self.request(|reply| RoomCommand::Snapshot { conn, reply }).await
    }

    /// Tells the room to stop (fire-and-forget).
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| self.unavailable())
    }

    /// Breaks the room's seating so the next accepted command fails its
    /// audit.
    #[cfg(test)]
    pub(crate) async fn corrupt(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Corrupt { reply }).await
    }

    /// Sends a command built around a fresh reply channel and waits for
    /// the answer. A closed channel on either leg means the actor is gone.
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_id.clone())
    }
}

/// What the actor loop should do after a command.
enum Flow {
    Continue,
    Stop,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    /// Per-member outbound channels.
    senders: HashMap<ConnectionId, PlayerSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until the room empties, breaks, or is shut down.
    async fn run(mut self) {
        let room_id = self.room.id().clone();
        tracing::info!(%room_id, host = %self.room.host(), "room actor started");

        // The creator hears about the room before anything else can happen
        // in it.
        let created = ServerEvent::RoomCreated {
            room: self.room.summary(),
        };
        self.send_to(self.room.host(), created);

        while let Some(cmd) = self.receiver.recv().await {
            if let Flow::Stop = self.handle(cmd) {
                break;
            }
        }

        tracing::info!(%room_id, "room actor stopped");
    }

    fn handle(&mut self, cmd: RoomCommand) -> Flow {
        match cmd {
            RoomCommand::Join {
                conn,
                name,
                sender,
                reply,
            } => {
                let result = self.handle_join(conn, &name, sender);
                let _ = reply.send(result);
                Flow::Continue
            }
            RoomCommand::Leave { conn, reply } => {
                let result = self.handle_leave(conn);
                let empty = matches!(result, Ok(LeaveOutcome { room_empty: true }));
                let _ = reply.send(result);
                if empty { Flow::Stop } else { Flow::Continue }
            }
            RoomCommand::Start { conn, reply } => {
                let result = self
                    .room
                    .start_match(conn)
                    .inspect(|_| {
                        tracing::info!(room_id = %self.room.id(), "match started");
                    });
                self.after_mutation(result, reply, |actor, opener| actor.broadcast_started(&opener))
            }
            RoomCommand::Move {
                conn,
                hand_index,
                side,
                reply,
            } => {
                let result = self.room.submit_move(conn, hand_index, side);
                self.after_mutation(result, reply, |actor, outcome| {
                    actor.broadcast_outcome(outcome);
                    outcome
                })
            }
            RoomCommand::Pass { conn, reply } => {
                let result = self.room.submit_pass(conn);
                self.after_mutation(result, reply, |actor, outcome| {
                    actor.broadcast_outcome(outcome);
                    outcome
                })
            }
            RoomCommand::Restart { conn, reply } => {
                let result = self.room.restart_round(conn).inspect(|_| {
                    tracing::info!(room_id = %self.room.id(), "round restarted");
                });
                self.after_mutation(result, reply, |actor, opener| actor.broadcast_started(&opener))
            }
            RoomCommand::Summary { reply } => {
                let _ = reply.send(self.room.summary());
                Flow::Continue
            }
            RoomCommand::Snapshot { conn, reply } => {
                let _ = reply.send(view::project(&self.room, conn));
                Flow::Continue
            }
            RoomCommand::Shutdown => {
                tracing::info!(room_id = %self.room.id(), "room shutting down");
                Flow::Stop
            }
            #[cfg(test)]
            RoomCommand::Corrupt { reply } => {
                self.room.seat_two_members_together();
                let _ = reply.send(());
                Flow::Continue
            }
        }
    }

    /// Audits the room after a command that may have changed it, then
    /// either broadcasts and replies, or tears the room down.
    ///
    /// Rejected commands changed nothing and are answered directly.
    fn after_mutation<T, U>(
        &mut self,
        result: Result<T, RoomError>,
        reply: Reply<U>,
        on_success: impl FnOnce(&Self, T) -> U,
    ) -> Flow {
        let value = match result {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(room_id = %self.room.id(), error = %err, "request rejected");
                let _ = reply.send(Err(err));
                return Flow::Continue;
            }
        };

        if let Err(err) = self.room.verify() {
            tracing::error!(room_id = %self.room.id(), error = %err, "room invariant violated, closing room");
            self.broadcast(|_| ServerEvent::Error {
                code: err.code(),
                message: "this room hit an internal error and was closed".into(),
            });
            let _ = reply.send(Err(err));
            return Flow::Stop;
        }

        let out = on_success(self, value);
        let _ = reply.send(Ok(out));
        Flow::Continue
    }

    fn handle_join(
        &mut self,
        conn: ConnectionId,
        name: &str,
        sender: PlayerSender,
    ) -> Result<RoomSummary, RoomError> {
        self.room.add_player(conn, name)?;
        self.senders.insert(conn, sender);

        let summary = self.room.summary();
        tracing::info!(
            room_id = %self.room.id(),
            %conn,
            players = summary.player_count,
            "player joined"
        );

        let player_name = self
            .room
            .member(conn)
            .map(|m| m.name.clone())
            .unwrap_or_default();
        self.broadcast(|_| ServerEvent::PlayerJoined {
            player_name: player_name.clone(),
            room: summary.clone(),
        });
        Ok(summary)
    }

    fn handle_leave(&mut self, conn: ConnectionId) -> Result<LeaveOutcome, RoomError> {
        let removed = self.room.remove_player(conn)?;
        self.senders.remove(&conn);

        let summary = self.room.summary();
        tracing::info!(
            room_id = %self.room.id(),
            %conn,
            player = %removed.name,
            players = summary.player_count,
            "player left"
        );

        if self.room.is_empty() {
            tracing::info!(room_id = %self.room.id(), "room empty");
            return Ok(LeaveOutcome { room_empty: true });
        }

        self.broadcast(|_| ServerEvent::PlayerLeft {
            player_name: removed.name.clone(),
            room: summary.clone(),
        });
        Ok(LeaveOutcome { room_empty: false })
    }

    fn broadcast_started(&self, opener: &Opener) {
        let first_move = view::first_move(&self.room, opener);
        tracing::info!(
            room_id = %self.room.id(),
            seat = %opener.seat,
            tile = ?opener.tile,
            "round dealt"
        );
        self.broadcast_snapshots(|snapshot| ServerEvent::GameStarted {
            snapshot,
            first_move: first_move.clone(),
        });
    }

    fn broadcast_outcome(&self, outcome: MoveOutcome) {
        match outcome {
            MoveOutcome::Continued => {
                self.broadcast_snapshots(|snapshot| ServerEvent::GameUpdate { snapshot });
            }
            MoveOutcome::RoundEnded { result, match_over } => {
                let winner_info = view::winner_info(&self.room, &result, match_over);
                tracing::info!(
                    room_id = %self.room.id(),
                    team = %result.team,
                    reason = ?result.reason,
                    match_over,
                    "round ended"
                );
                if match_over {
                    tracing::info!(room_id = %self.room.id(), winner = %winner_info.team_name, "match finished");
                }
                self.broadcast_snapshots(|snapshot| ServerEvent::RoundEnded {
                    snapshot,
                    winner_info: winner_info.clone(),
                });
            }
        }
    }

    /// Sends every member an event built around their own snapshot.
    fn broadcast_snapshots(&self, make: impl Fn(GameSnapshot) -> ServerEvent) {
        for member in self.room.members() {
            if let Some(snapshot) = view::project(&self.room, member.conn) {
                self.send_to(member.conn, make(snapshot));
            }
        }
    }

    /// Sends every member an event. `make` receives the recipient.
    fn broadcast(&self, make: impl Fn(ConnectionId) -> ServerEvent) {
        for member in self.room.members() {
            self.send_to(member.conn, make(member.conn));
        }
    }

    /// Sends an event to a single member. Silently drops it if the
    /// receiver is gone (the connection is closing).
    fn send_to(&self, conn: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&conn) {
            let _ = sender.send(event);
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
///
/// The host in `room` must be its only member and `host_sender` its
/// outbound channel. The host receives `roomCreated` first.
pub(crate) fn spawn_room(room: Room, host_sender: PlayerSender, channel_size: usize) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size.max(1));
    let room_id = room.id().clone();

    let mut senders = HashMap::new();
    senders.insert(room.host(), host_sender);

    let actor = RoomActor {
        room,
        senders,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle { room_id, sender: tx }
}
