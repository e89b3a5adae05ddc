//! # Skirmish
//!
//! Two-player rock-paper-scissors duel server.
//!
//! Clients connect over WebSocket, pick a room by name, confirm, and play
//! timed rounds until one of them runs out of health. Every room is an
//! isolated actor; see [`skirmish_room`] for the match rules.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skirmish::prelude::*;
//!
//! # async fn run() -> Result<(), SkirmishError> {
//! let server = SkirmishServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::SkirmishError;
pub use server::{SkirmishServer, SkirmishServerBuilder};

pub mod prelude {
    pub use crate::{ServerConfig, SkirmishError, SkirmishServer, SkirmishServerBuilder};
    pub use skirmish_protocol::{
        ClientEvent, ClientId, Codec, Envelope, GameOutcome, HealthMap, JsonCodec, Move,
        PlayerMove, RoomName, ServerEvent,
    };
    pub use skirmish_room::{
        MoveSource, MoveSourceFactory, RandomMoves, RoomConfig, RoomError, RoomInfo,
        RoomManager, ScriptedMoves,
    };
}
