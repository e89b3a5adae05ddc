//! Room actors and the rock-paper-scissors match state machine.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! roster, confirmation sets, round moves, health pool and timers. The
//! [`RoomManager`] maps room names to running actors and keeps the
//! client-to-room reverse index.
//!
//! # Key types
//!
//! - [`RoomManager`]: get-or-create rooms, route client events
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomConfig`]: round limit, pacing delays, countdown
//! - [`MoveSource`]: picks auto-moves for participants who ran out of time
//! - [`rules`]: the two-player cap, round resolution and elimination, free of any I/O

mod config;
mod error;
mod manager;
mod moves;
mod room;
pub mod rules;

pub use config::RoomConfig;
pub use error::RoomError;
pub use manager::RoomManager;
pub use moves::{MoveSource, MoveSourceFactory, RandomMoves, ScriptedMoves};
pub use room::{ClientSender, RoomHandle, RoomInfo};
