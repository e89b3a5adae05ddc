//! Room configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration shared by every room a [`RoomManager`](crate::RoomManager)
/// spawns.
///
/// The pacing delays exist so clients can play their reveal, damage and
/// death animations in sequence. Only their relative order matters:
/// `round-end`, then `health-update`, then `game-over`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// How long a round stays open before missing moves are auto-picked.
    pub round_time_limit: Duration,

    /// Delay between `round-end` and the follow-up `health-update`.
    pub health_reveal_delay: Duration,

    /// Delay between `round-end` and the elimination check.
    pub game_over_check_delay: Duration,

    /// Delay between a decided elimination check and `game-over`.
    pub game_over_announce_delay: Duration,

    /// Delay between the last `play-again` request and the rematch reset.
    pub rematch_delay: Duration,

    /// Countdown value carried by `game-start` and `rematch`.
    pub countdown: u32,

    /// Open the next round automatically after each health reveal instead
    /// of waiting for a `ready-for-round`.
    pub auto_advance: bool,

    /// Bound of each room actor's command queue.
    pub command_channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            round_time_limit: Duration::from_secs(10),
            health_reveal_delay: Duration::from_secs(5),
            game_over_check_delay: Duration::from_millis(100),
            game_over_announce_delay: Duration::from_millis(6_800),
            rematch_delay: Duration::from_millis(200),
            countdown: 3,
            auto_advance: false,
            command_channel_size: 64,
        }
    }
}
