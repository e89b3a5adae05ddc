//! Error types for the room layer.
//!
//! These never reach a client. The server logs them; the client-visible
//! side of a rejection (`room-full`) is sent by the room itself.

use skirmish_protocol::{ClientId, RoomName};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room already holds the maximum number of participants.
    #[error("room {0} is full")]
    RoomFull(RoomName),

    /// The client is not a member of this room.
    #[error("client {0} not in room {1}")]
    NotInRoom(ClientId, RoomName),

    /// The room's actor has stopped or its command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomName),
}
