//! Room actor: an isolated Tokio task that owns one match.
//!
//! Each room runs in its own task and is reached only through its command
//! channel. Commands and timers are handled one at a time to completion, so
//! the match state needs no locking. Pacing delays and the round timeout
//! live in the actor's own [`DeadlineQueue`], raced against the command
//! channel; no handler ever sleeps.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use skirmish_protocol::{
    ClientId, GameOutcome, HealthMap, Move, PlayerMove, Recipient, RoomName, ServerEvent,
};
use skirmish_timer::{DeadlineQueue, Generation};
use tokio::sync::{mpsc, oneshot};

use crate::rules::{self, MAX_HEALTH, MAX_PLAYERS};
use crate::{MoveSource, RoomConfig, RoomError};

/// Channel sender delivering outbound events to one client's connection.
pub type ClientSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a room actor through its channel.
///
/// Variants with a `reply` are request/response; the rest are
/// fire-and-forget.
pub(crate) enum RoomCommand {
    Join {
        client: ClientId,
        sender: ClientSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    /// Replies with the number of participants left.
    Leave {
        client: ClientId,
        reply: oneshot::Sender<Result<usize, RoomError>>,
    },
    Confirm {
        client: ClientId,
    },
    Ready {
        client: ClientId,
    },
    Move {
        client: ClientId,
        mv: Move,
    },
    PlayAgain {
        client: ClientId,
    },
    Info {
        reply: oneshot::Sender<RoomInfo>,
    },
}

/// A snapshot of a room's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub name: RoomName,
    /// Roster in join order.
    pub players: Vec<ClientId>,
    pub confirmed: Vec<ClientId>,
    pub play_again: Vec<ClientId>,
    pub health: HealthMap,
    pub game_over: bool,
    /// Whether a round is accepting moves.
    pub round_open: bool,
}

/// Handle to a running room actor.
///
/// Cheap to clone; the [`RoomManager`](crate::RoomManager) holds one per
/// room.
#[derive(Clone)]
pub struct RoomHandle {
    name: RoomName,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn name(&self) -> &RoomName {
        &self.name
    }

    /// Whether the actor behind this handle has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Whether both handles point at the same actor.
    pub fn same_room(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    pub(crate) async fn join(
        &self,
        client: ClientId,
        sender: ClientSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            client,
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    pub(crate) async fn leave(&self, client: ClientId) -> Result<usize, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Leave {
            client,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    pub(crate) async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Info { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    pub(crate) async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender.send(cmd).await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.name.clone())
    }
}

/// Deadlines a room can schedule on itself.
///
/// `round` tags come from the round generation, `game` tags from the match
/// generation. A fired timer whose tag is no longer current does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    RoundDeadline { round: u64 },
    HealthReveal { game: u64 },
    GameOverCheck { game: u64 },
    GameOverAnnounce { game: u64 },
    Rematch { game: u64, requester: ClientId },
}

enum Wake {
    Command(Option<RoomCommand>),
    Timer(Timer),
}

/// Whether the actor loop keeps running after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    name: RoomName,
    config: RoomConfig,
    /// Roster in join order.
    players: Vec<ClientId>,
    senders: HashMap<ClientId, ClientSender>,
    confirmed: Vec<ClientId>,
    play_again: Vec<ClientId>,
    /// Current-round moves in submission order.
    moves: Vec<PlayerMove>,
    health: HealthMap,
    game_over: bool,
    /// Decided by the elimination check, waiting to be announced.
    pending_outcome: Option<GameOutcome>,
    round: Generation,
    round_open: bool,
    game: Generation,
    timers: DeadlineQueue<Timer>,
    move_source: Box<dyn MoveSource>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until the room empties or every handle is gone.
    async fn run(mut self) {
        tracing::info!(room = %self.name, "room actor started");

        loop {
            let wake = tokio::select! {
                cmd = self.receiver.recv() => Wake::Command(cmd),
                timer = self.timers.next_due() => Wake::Timer(timer),
            };

            match wake {
                Wake::Command(None) => break,
                Wake::Command(Some(cmd)) => {
                    if self.handle_command(cmd) == Flow::Stop {
                        break;
                    }
                }
                Wake::Timer(timer) => self.handle_timer(timer),
            }
        }

        tracing::info!(room = %self.name, "room actor stopped");
    }

    fn handle_command(&mut self, cmd: RoomCommand) -> Flow {
        match cmd {
            RoomCommand::Join {
                client,
                sender,
                reply,
            } => {
                let result = self.handle_join(client, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Leave { client, reply } => {
                let result = self.handle_leave(client);
                let _ = reply.send(result);
                if self.players.is_empty() {
                    return Flow::Stop;
                }
            }
            RoomCommand::Confirm { client } => self.handle_confirm(client),
            RoomCommand::Ready { client } => {
                if self.is_member(client) {
                    self.start_round();
                } else {
                    self.ignore(client, "ready from non-member");
                }
            }
            RoomCommand::Move { client, mv } => self.handle_move(client, mv),
            RoomCommand::PlayAgain { client } => self.handle_play_again(client),
            RoomCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
        }
        Flow::Continue
    }

    fn handle_timer(&mut self, timer: Timer) {
        match timer {
            Timer::RoundDeadline { round } => {
                if self.round.is_current(round) {
                    tracing::debug!(room = %self.name, round, "round timed out");
                    self.resolve_round();
                }
            }
            Timer::HealthReveal { game } if self.game.is_current(game) => {
                self.broadcast(ServerEvent::HealthUpdate {
                    health: self.health.clone(),
                });
                if self.config.auto_advance {
                    self.start_round();
                }
            }
            Timer::GameOverCheck { game } if self.game.is_current(game) => {
                self.check_game_over();
            }
            Timer::GameOverAnnounce { game } if self.game.is_current(game) => {
                self.announce_game_over();
            }
            Timer::Rematch { game, requester } if self.game.is_current(game) => {
                self.rematch(requester);
            }
            stale => {
                tracing::trace!(room = %self.name, timer = ?stale, "stale timer ignored");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    fn handle_join(&mut self, client: ClientId, sender: ClientSender) -> Result<(), RoomError> {
        if self.is_member(client) {
            // Rejoining the same room refreshes the sender and re-announces.
            self.senders.insert(client, sender);
        } else if self.players.len() >= MAX_PLAYERS {
            tracing::info!(room = %self.name, %client, "join rejected, room full");
            let _ = sender.send(ServerEvent::RoomFull {
                message: format!("Room {} is full", self.name),
            });
            return Err(RoomError::RoomFull(self.name.clone()));
        } else {
            self.players.push(client);
            self.senders.insert(client, sender);
            self.health.entry(client).or_insert(MAX_HEALTH);
            tracing::info!(
                room = %self.name,
                %client,
                players = self.players.len(),
                "player joined"
            );
        }

        self.broadcast(ServerEvent::PlayersUpdate {
            players: self.players.clone(),
        });
        self.broadcast(ServerEvent::PlayerJoined { player_id: client });
        self.broadcast(ServerEvent::PlayersConfirmed {
            confirmed: self.confirmed.clone(),
        });
        self.broadcast(ServerEvent::HealthUpdate {
            health: self.health.clone(),
        });
        Ok(())
    }

    fn handle_leave(&mut self, client: ClientId) -> Result<usize, RoomError> {
        if !self.is_member(client) {
            return Err(RoomError::NotInRoom(client, self.name.clone()));
        }

        self.players.retain(|id| *id != client);
        self.senders.remove(&client);
        self.confirmed.retain(|id| *id != client);
        self.play_again.retain(|id| *id != client);
        self.moves.retain(|m| m.id != client);
        self.health.remove(&client);

        tracing::info!(
            room = %self.name,
            %client,
            players = self.players.len(),
            "player left"
        );

        if !self.confirmed.is_empty() {
            self.broadcast(ServerEvent::PlayersConfirmed {
                confirmed: self.confirmed.clone(),
            });
        }
        self.broadcast(ServerEvent::PlayersUpdate {
            players: self.players.clone(),
        });

        Ok(self.players.len())
    }

    // -----------------------------------------------------------------------
    // Match start
    // -----------------------------------------------------------------------

    fn handle_confirm(&mut self, client: ClientId) {
        if !self.is_member(client) {
            return self.ignore(client, "confirm from non-member");
        }
        if self.confirmed.contains(&client) {
            return self.ignore(client, "already confirmed");
        }
        if self.confirmed.len() >= MAX_PLAYERS {
            return self.ignore(client, "confirmations full");
        }

        self.confirmed.push(client);
        self.broadcast(ServerEvent::PlayersConfirmed {
            confirmed: self.confirmed.clone(),
        });

        if self.confirmed.len() == MAX_PLAYERS && self.players.len() == MAX_PLAYERS {
            self.reset_match();
            self.broadcast(ServerEvent::HealthUpdate {
                health: self.health.clone(),
            });
            self.confirmed.clear();
            tracing::info!(room = %self.name, "match started");
            self.broadcast(ServerEvent::GameStart {
                countdown: self.config.countdown,
            });
        }
    }

    /// Start a fresh match: full health, no game-over, and every timer of the
    /// previous match invalidated.
    fn reset_match(&mut self) {
        self.game.bump();
        self.round.bump();
        self.round_open = false;
        self.timers.clear();
        self.pending_outcome = None;
        self.game_over = false;
        self.health = self.players.iter().map(|id| (*id, MAX_HEALTH)).collect();
    }

    // -----------------------------------------------------------------------
    // Rounds
    // -----------------------------------------------------------------------

    fn start_round(&mut self) {
        if self.game_over || self.pending_outcome.is_some() {
            tracing::debug!(room = %self.name, "round start ignored, match decided");
            return;
        }

        self.moves.clear();
        let round = self.round.bump();
        self.round_open = true;

        let limit = self.config.round_time_limit;
        self.broadcast(ServerEvent::RoundStart {
            time_limit: limit.as_secs(),
            start_at: unix_millis(),
        });

        self.timers
            .cancel_where(|t| matches!(t, Timer::RoundDeadline { .. }));
        self.timers.schedule(limit, Timer::RoundDeadline { round });
        tracing::debug!(room = %self.name, round, "round started");
    }

    fn handle_move(&mut self, client: ClientId, mv: Move) {
        if self.game_over {
            return self.ignore(client, "move after game over");
        }
        if !self.is_member(client) {
            return self.ignore(client, "move from non-member");
        }

        match self.moves.iter_mut().find(|m| m.id == client) {
            Some(existing) => existing.mv = mv,
            None => self.moves.push(PlayerMove { id: client, mv }),
        }

        if self.round_open && self.moves.len() == self.players.len() {
            self.timers
                .cancel_where(|t| matches!(t, Timer::RoundDeadline { .. }));
            self.resolve_round();
        }
    }

    /// Resolve the open round. A round resolves at most once; later calls
    /// for the same round do nothing.
    fn resolve_round(&mut self) {
        if !self.round_open {
            return;
        }
        self.round_open = false;

        let missing: Vec<ClientId> = self
            .players
            .iter()
            .copied()
            .filter(|id| !self.moves.iter().any(|m| m.id == *id))
            .collect();
        for client in missing {
            let mv = self.move_source.pick();
            self.moves.push(PlayerMove { id: client, mv });
            self.send_to(client, ServerEvent::AutoMove { mv });
        }

        let &[first, second] = self.moves.as_slice() else {
            tracing::debug!(
                room = %self.name,
                moves = self.moves.len(),
                "round closed without a result"
            );
            return;
        };

        let result = rules::resolve(first, second);
        rules::apply_damage(&mut self.health, &result);
        tracing::info!(
            room = %self.name,
            winner = ?result.winner,
            damage = result.damage,
            "round resolved"
        );

        self.broadcast(ServerEvent::RoundEnd {
            players: result.players.to_vec(),
            winner: result.winner,
            damage: result.damage,
        });

        let game = self.game.current();
        self.timers
            .schedule(self.config.health_reveal_delay, Timer::HealthReveal { game });
        self.timers
            .schedule(self.config.game_over_check_delay, Timer::GameOverCheck { game });
    }

    // -----------------------------------------------------------------------
    // Elimination
    // -----------------------------------------------------------------------

    fn check_game_over(&mut self) {
        if self.game_over || self.pending_outcome.is_some() {
            return;
        }
        let Some(outcome) = rules::check_game_over(&self.health) else {
            return;
        };

        // A round opened in the meantime can no longer count.
        self.round_open = false;
        self.timers
            .cancel_where(|t| matches!(t, Timer::RoundDeadline { .. }));

        self.pending_outcome = Some(outcome);
        let game = self.game.current();
        self.timers.schedule(
            self.config.game_over_announce_delay,
            Timer::GameOverAnnounce { game },
        );
    }

    fn announce_game_over(&mut self) {
        let Some(outcome) = self.pending_outcome.take() else {
            return;
        };
        self.game_over = true;
        tracing::info!(room = %self.name, ?outcome, "game over");
        self.broadcast(ServerEvent::GameOver {
            winner: outcome,
            health: self.health.clone(),
        });
    }

    // -----------------------------------------------------------------------
    // Rematch
    // -----------------------------------------------------------------------

    fn handle_play_again(&mut self, client: ClientId) {
        if !self.is_member(client) {
            return self.ignore(client, "play-again from non-member");
        }

        self.moves.clear();
        if !self.play_again.contains(&client) {
            self.play_again.push(client);
        }
        self.broadcast(ServerEvent::PlayAgainStatus {
            confirmed: self.play_again.clone(),
        });

        if self.play_again.len() == self.players.len() {
            let game = self.game.current();
            self.timers.schedule(
                self.config.rematch_delay,
                Timer::Rematch {
                    game,
                    requester: client,
                },
            );
        } else {
            self.send_to(client, ServerEvent::WaitingForPlayers);
        }
    }

    fn rematch(&mut self, requester: ClientId) {
        self.send_to(requester, ServerEvent::PlayAgainConfirmed);
        self.play_again.clear();
        self.reset_match();
        self.broadcast(ServerEvent::HealthUpdate {
            health: self.health.clone(),
        });
        tracing::info!(room = %self.name, "rematch started");
        self.broadcast(ServerEvent::Rematch {
            countdown: self.config.countdown,
        });
    }

    // -----------------------------------------------------------------------
    // Delivery
    // -----------------------------------------------------------------------

    fn dispatch(&self, recipient: Recipient, event: ServerEvent) {
        match recipient {
            Recipient::Room => {
                for client in &self.players {
                    if let Some(sender) = self.senders.get(client) {
                        let _ = sender.send(event.clone());
                    }
                }
            }
            Recipient::Client(client) => {
                if let Some(sender) = self.senders.get(&client) {
                    let _ = sender.send(event);
                }
            }
        }
    }

    fn broadcast(&self, event: ServerEvent) {
        self.dispatch(Recipient::Room, event);
    }

    fn send_to(&self, client: ClientId, event: ServerEvent) {
        self.dispatch(Recipient::Client(client), event);
    }

    fn is_member(&self, client: ClientId) -> bool {
        self.players.contains(&client)
    }

    fn ignore(&self, client: ClientId, reason: &str) {
        tracing::debug!(room = %self.name, %client, reason, "command ignored");
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            name: self.name.clone(),
            players: self.players.clone(),
            confirmed: self.confirmed.clone(),
            play_again: self.play_again.clone(),
            health: self.health.clone(),
            game_over: self.game_over,
            round_open: self.round_open,
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Spawns a new room actor task and returns a handle to communicate with it.
pub(crate) fn spawn_room(
    name: RoomName,
    config: RoomConfig,
    move_source: Box<dyn MoveSource>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.command_channel_size.max(1));

    let actor = RoomActor {
        name: name.clone(),
        config,
        players: Vec::new(),
        senders: HashMap::new(),
        confirmed: Vec::new(),
        play_again: Vec::new(),
        moves: Vec::new(),
        health: HealthMap::new(),
        game_over: false,
        pending_outcome: None,
        round: Generation::new(),
        round_open: false,
        game: Generation::new(),
        timers: DeadlineQueue::new(),
        move_source,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { name, sender: tx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedMoves;

    fn client() -> (ClientSender, mpsc::UnboundedReceiver<ServerEvent>) {
        mpsc::unbounded_channel()
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_join_broadcasts_in_order() {
        let handle = spawn_room(
            RoomName::from("r1"),
            RoomConfig::default(),
            Box::new(ScriptedMoves::new([Move::Rock])),
        );
        let (tx, mut rx) = client();

        handle.join(ClientId(1), tx).await.unwrap();

        let names: Vec<&str> = drain(&mut rx).iter().map(ServerEvent::name).collect();
        assert_eq!(
            names,
            ["players-update", "player-joined", "players-confirmed", "health-update"]
        );
    }

    #[tokio::test]
    async fn test_actor_stops_when_last_player_leaves() {
        let handle = spawn_room(
            RoomName::from("r1"),
            RoomConfig::default(),
            Box::new(ScriptedMoves::new([Move::Rock])),
        );
        let (tx, _rx) = client();
        handle.join(ClientId(1), tx).await.unwrap();

        assert_eq!(handle.leave(ClientId(1)).await.unwrap(), 0);

        let err = handle.info().await.unwrap_err();
        assert!(matches!(err, RoomError::Unavailable(_)));
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn test_leave_by_non_member_is_rejected() {
        let handle = spawn_room(
            RoomName::from("r1"),
            RoomConfig::default(),
            Box::new(ScriptedMoves::new([Move::Rock])),
        );
        let (tx, _rx) = client();
        handle.join(ClientId(1), tx).await.unwrap();

        let err = handle.leave(ClientId(2)).await.unwrap_err();
        assert!(matches!(err, RoomError::NotInRoom(ClientId(2), _)));
    }
}
