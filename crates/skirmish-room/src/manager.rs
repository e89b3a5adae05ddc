//! Room manager: get-or-create rooms by name and route clients to them.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use skirmish_protocol::{ClientId, Move, RoomName};

use crate::room::{RoomCommand, spawn_room};
use crate::{
    ClientSender, MoveSourceFactory, RandomMoves, RoomConfig, RoomError, RoomHandle, RoomInfo,
};

/// How often a join retries against a room whose actor stopped between
/// lookup and delivery.
const JOIN_ATTEMPTS: usize = 3;

/// Manages all active rooms and tracks which client is in which room.
///
/// Rooms are created on the first join that names them and removed once
/// their last participant leaves. Both tables sit behind short
/// `std::sync::Mutex` sections that are never held across an `.await`;
/// everything that touches match state runs inside the room's actor.
pub struct RoomManager {
    config: RoomConfig,
    moves: MoveSourceFactory,

    /// Running rooms, keyed by name.
    rooms: Mutex<HashMap<RoomName, RoomHandle>>,

    /// Maps each client to the room it currently occupies.
    /// A client is in at most ONE room at a time.
    clients: Mutex<HashMap<ClientId, RoomName>>,
}

impl RoomManager {
    /// Creates an empty manager whose rooms pick auto-moves at random.
    pub fn new(config: RoomConfig) -> Self {
        Self::with_move_source(config, RandomMoves::factory())
    }

    /// Creates an empty manager with a custom auto-move source.
    pub fn with_move_source(config: RoomConfig, moves: MoveSourceFactory) -> Self {
        Self {
            config,
            moves,
            rooms: Mutex::new(HashMap::new()),
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Puts `client` into `room`, leaving its current room first.
    ///
    /// The room is created if it does not exist yet. When the room is
    /// already full the client receives `room-full` on `sender` and ends up
    /// in no room.
    pub async fn join(
        &self,
        client: ClientId,
        room: &RoomName,
        sender: ClientSender,
    ) -> Result<(), RoomError> {
        if let Some(current) = self.room_of(client) {
            if current != *room {
                if let Err(e) = self.leave(client, &current).await {
                    tracing::warn!(%client, room = %current, error = %e, "leave before join failed");
                }
            }
        }

        for _ in 0..JOIN_ATTEMPTS {
            let handle = self.get_or_create(room);
            match handle.join(client, sender.clone()).await {
                Ok(()) => {
                    self.clients().insert(client, room.clone());
                    return Ok(());
                }
                Err(RoomError::Unavailable(_)) => {
                    // The actor emptied and stopped under us; start over.
                    self.forget(&handle);
                }
                Err(e) => {
                    self.clear_client(client, room);
                    return Err(e);
                }
            }
        }

        self.clear_client(client, room);
        Err(RoomError::Unavailable(room.clone()))
    }

    /// Removes `client` from `room`.
    pub async fn leave(&self, client: ClientId, room: &RoomName) -> Result<(), RoomError> {
        let Some(handle) = self.handle(room) else {
            self.clear_client(client, room);
            return Err(RoomError::NotInRoom(client, room.clone()));
        };

        let result = handle.leave(client).await;
        self.clear_client(client, room);

        if matches!(result, Ok(0) | Err(RoomError::Unavailable(_))) {
            self.forget(&handle);
        }
        result.map(|_| ())
    }

    /// Full leave of whatever room `client` occupies. Used on disconnect.
    pub async fn disconnect(&self, client: ClientId) {
        let Some(room) = self.room_of(client) else {
            return;
        };
        if let Err(e) = self.leave(client, &room).await {
            tracing::debug!(%client, %room, error = %e, "leave on disconnect failed");
        }
    }

    /// Signal readiness to start a match.
    pub async fn confirm(&self, client: ClientId, room: &RoomName) -> Result<(), RoomError> {
        self.forward(room, RoomCommand::Confirm { client }).await
    }

    /// Open the next round.
    pub async fn ready(&self, client: ClientId, room: &RoomName) -> Result<(), RoomError> {
        self.forward(room, RoomCommand::Ready { client }).await
    }

    /// Submit a move for the open round.
    pub async fn submit_move(
        &self,
        client: ClientId,
        room: &RoomName,
        mv: Move,
    ) -> Result<(), RoomError> {
        self.forward(room, RoomCommand::Move { client, mv }).await
    }

    /// Request a rematch.
    pub async fn play_again(&self, client: ClientId, room: &RoomName) -> Result<(), RoomError> {
        self.forward(room, RoomCommand::PlayAgain { client }).await
    }

    /// The room `client` currently occupies, if any.
    pub fn room_of(&self, client: ClientId) -> Option<RoomName> {
        self.clients().get(&client).cloned()
    }

    /// Snapshot of a room, or `None` if it does not exist.
    pub async fn room_info(&self, room: &RoomName) -> Option<RoomInfo> {
        self.handle(room)?.info().await.ok()
    }

    /// Number of running rooms.
    pub fn room_count(&self) -> usize {
        self.rooms().len()
    }

    /// Names of all running rooms.
    pub fn room_names(&self) -> Vec<RoomName> {
        self.rooms().keys().cloned().collect()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Fire-and-forget delivery. Events for rooms that do not exist are
    /// dropped.
    async fn forward(&self, room: &RoomName, cmd: RoomCommand) -> Result<(), RoomError> {
        let Some(handle) = self.handle(room) else {
            tracing::debug!(%room, "event for unknown room dropped");
            return Ok(());
        };
        let result = handle.send(cmd).await;
        if result.is_err() {
            self.forget(&handle);
        }
        result
    }

    fn get_or_create(&self, room: &RoomName) -> RoomHandle {
        let mut rooms = self.rooms();
        if let Some(handle) = rooms.get(room) {
            if !handle.is_closed() {
                return handle.clone();
            }
        }

        let handle = spawn_room(room.clone(), self.config.clone(), (self.moves)());
        rooms.insert(room.clone(), handle.clone());
        tracing::info!(%room, rooms = rooms.len(), "room created");
        handle
    }

    fn handle(&self, room: &RoomName) -> Option<RoomHandle> {
        self.rooms().get(room).cloned()
    }

    /// Drops the directory entry for `handle`'s room, unless it was already
    /// replaced by a newer actor.
    fn forget(&self, handle: &RoomHandle) {
        let mut rooms = self.rooms();
        if rooms
            .get(handle.name())
            .is_some_and(|current| current.same_room(handle))
        {
            rooms.remove(handle.name());
            tracing::info!(room = %handle.name(), rooms = rooms.len(), "room removed");
        }
    }

    /// Clears the reverse-index entry for `client` if it points at `room`.
    fn clear_client(&self, client: ClientId, room: &RoomName) {
        let mut clients = self.clients();
        if clients.get(&client) == Some(room) {
            clients.remove(&client);
        }
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<RoomName, RoomHandle>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn clients(&self) -> MutexGuard<'_, HashMap<ClientId, RoomName>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
