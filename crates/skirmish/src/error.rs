//! Unified error type for the server crate.

use skirmish_protocol::ProtocolError;
use skirmish_room::RoomError;
use skirmish_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SkirmishError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, not a member, unavailable).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Invalid server configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}
