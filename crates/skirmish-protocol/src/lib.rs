//! Wire protocol for skirmish.
//!
//! This crate defines what travels between a client and the server:
//!
//! - **Identifiers and values** ([`ClientId`], [`RoomName`], [`Move`],
//!   [`GameOutcome`]).
//! - **Events** ([`ClientEvent`] inbound, [`ServerEvent`] outbound), each
//!   wrapped in an [`Envelope`] on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how envelopes become
//!   bytes and back.
//!
//! The protocol layer knows nothing about rooms or timers. It only fixes
//! the JSON shapes that clients depend on.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope<ClientEvent>) → Room manager
//! ```

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ClientEvent, PlayerMove, ServerEvent};
pub use types::{
    ClientId, Envelope, GameOutcome, HealthMap, Move, Recipient, RoomName,
};
