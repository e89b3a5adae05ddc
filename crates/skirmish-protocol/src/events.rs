//! Inbound and outbound events.
//!
//! Both directions use adjacently tagged JSON so clients can switch on a
//! single `event` field:
//!
//! ```text
//! { "event": "join-room",  "data": "r1" }
//! { "event": "player-move", "data": { "roomId": "r1", "move": "rock" } }
//! { "event": "round-end",  "data": { "players": [...], "winner": 3, "damage": 20 } }
//! ```

use serde::{Deserialize, Serialize};

use crate::{ClientId, GameOutcome, HealthMap, Move, RoomName};

/// Events a client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Enter a room, leaving any other room first.
    JoinRoom(RoomName),
    /// Leave a room.
    LeaveRoom(RoomName),
    /// Signal readiness to start a match.
    ConfirmPlayer(RoomName),
    /// Ask the room to open the next round.
    ReadyForRound { room_id: RoomName },
    /// Submit a move for the open round.
    PlayerMove {
        room_id: RoomName,
        #[serde(rename = "move")]
        mv: Move,
    },
    /// Request a rematch after a match ended.
    PlayAgain { room_id: RoomName },
}

impl ClientEvent {
    /// The room this event is addressed to.
    pub fn room(&self) -> &RoomName {
        match self {
            Self::JoinRoom(room)
            | Self::LeaveRoom(room)
            | Self::ConfirmPlayer(room)
            | Self::ReadyForRound { room_id: room }
            | Self::PlayerMove { room_id: room, .. }
            | Self::PlayAgain { room_id: room } => room,
        }
    }
}

/// One participant's move as reported in `round-end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMove {
    pub id: ClientId,
    #[serde(rename = "move")]
    pub mv: Move,
}

/// Events the server sends to clients.
///
/// Unless noted, an event is broadcast to the whole room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Current roster, in join order.
    PlayersUpdate { players: Vec<ClientId> },
    /// Someone entered the room.
    PlayerJoined { player_id: ClientId },
    /// Participants that confirmed readiness, in confirmation order.
    PlayersConfirmed { confirmed: Vec<ClientId> },
    /// To one: the join was rejected because the room already has two
    /// participants.
    RoomFull { message: String },
    /// Both participants confirmed; the match starts after `countdown`.
    GameStart { countdown: u32 },
    /// Everyone asked for a rematch; it starts after `countdown`.
    Rematch { countdown: u32 },
    /// A round opened. `time_limit` is in seconds, `start_at` is the
    /// server's wall clock in Unix milliseconds.
    RoundStart { time_limit: u64, start_at: u64 },
    /// To one: the move picked on your behalf when the round timed out.
    AutoMove {
        #[serde(rename = "move")]
        mv: Move,
    },
    /// Result of a resolved round. `winner` is `None` on equal moves.
    RoundEnd {
        players: Vec<PlayerMove>,
        winner: Option<ClientId>,
        damage: u8,
    },
    /// Full health mapping.
    HealthUpdate { health: HealthMap },
    /// The match is over.
    GameOver {
        winner: GameOutcome,
        health: HealthMap,
    },
    /// Participants that asked for a rematch so far.
    PlayAgainStatus { confirmed: Vec<ClientId> },
    /// To one: your rematch request completed the set.
    PlayAgainConfirmed,
    /// To one: your rematch request is recorded; waiting for the others.
    WaitingForPlayers,
}

impl ServerEvent {
    /// The event name as it appears on the wire. Handy for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlayersUpdate { .. } => "players-update",
            Self::PlayerJoined { .. } => "player-joined",
            Self::PlayersConfirmed { .. } => "players-confirmed",
            Self::RoomFull { .. } => "room-full",
            Self::GameStart { .. } => "game-start",
            Self::Rematch { .. } => "rematch",
            Self::RoundStart { .. } => "round-start",
            Self::AutoMove { .. } => "auto-move",
            Self::RoundEnd { .. } => "round-end",
            Self::HealthUpdate { .. } => "health-update",
            Self::GameOver { .. } => "game-over",
            Self::PlayAgainStatus { .. } => "play-again-status",
            Self::PlayAgainConfirmed => "play-again-confirmed",
            Self::WaitingForPlayers => "waiting-for-players",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_room_carries_bare_room_name() {
        let event: ClientEvent =
            serde_json::from_value(json!({ "event": "join-room", "data": "r1" })).unwrap();
        assert_eq!(event, ClientEvent::JoinRoom(RoomName::from("r1")));
        assert_eq!(event.room().as_str(), "r1");
    }

    #[test]
    fn test_player_move_uses_room_id_and_move_keys() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "player-move",
            "data": { "roomId": "r1", "move": "scissors" }
        }))
        .unwrap();

        assert_eq!(
            event,
            ClientEvent::PlayerMove {
                room_id: RoomName::from("r1"),
                mv: Move::Scissors,
            }
        );
    }

    #[test]
    fn test_ready_and_play_again_payloads() {
        let ready: ClientEvent = serde_json::from_value(json!({
            "event": "ready-for-round",
            "data": { "roomId": "arena" }
        }))
        .unwrap();
        assert_eq!(ready.room().as_str(), "arena");

        let again: ClientEvent = serde_json::from_value(json!({
            "event": "play-again",
            "data": { "roomId": "arena" }
        }))
        .unwrap();
        assert!(matches!(again, ClientEvent::PlayAgain { .. }));
    }

    #[test]
    fn test_unknown_client_event_is_rejected() {
        let result: Result<ClientEvent, _> =
            serde_json::from_value(json!({ "event": "fly-to-moon", "data": "r1" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_round_start_json_shape() {
        let json = serde_json::to_value(ServerEvent::RoundStart {
            time_limit: 10,
            start_at: 1_700_000_000_000,
        })
        .unwrap();

        assert_eq!(json["event"], "round-start");
        assert_eq!(json["data"]["timeLimit"], 10);
        assert_eq!(json["data"]["startAt"], 1_700_000_000_000u64);
    }

    #[test]
    fn test_round_end_json_shape() {
        let json = serde_json::to_value(ServerEvent::RoundEnd {
            players: vec![
                PlayerMove { id: ClientId(1), mv: Move::Rock },
                PlayerMove { id: ClientId(2), mv: Move::Scissors },
            ],
            winner: Some(ClientId(1)),
            damage: 20,
        })
        .unwrap();

        assert_eq!(
            json,
            json!({
                "event": "round-end",
                "data": {
                    "players": [
                        { "id": 1, "move": "rock" },
                        { "id": 2, "move": "scissors" }
                    ],
                    "winner": 1,
                    "damage": 20
                }
            })
        );
    }

    #[test]
    fn test_round_end_without_winner_is_null() {
        let json = serde_json::to_value(ServerEvent::RoundEnd {
            players: vec![],
            winner: None,
            damage: 5,
        })
        .unwrap();
        assert!(json["data"]["winner"].is_null());
    }

    #[test]
    fn test_game_over_tie_json_shape() {
        let json = serde_json::to_value(ServerEvent::GameOver {
            winner: GameOutcome::Tie,
            health: [(ClientId(1), 0), (ClientId(2), 0)].into(),
        })
        .unwrap();

        assert_eq!(json["event"], "game-over");
        assert_eq!(json["data"]["winner"], "tie");
        assert_eq!(json["data"]["health"]["2"], 0);
    }

    #[test]
    fn test_unit_events_have_no_data() {
        let json = serde_json::to_value(ServerEvent::WaitingForPlayers).unwrap();
        assert_eq!(json, json!({ "event": "waiting-for-players" }));
        assert_eq!(ServerEvent::PlayAgainConfirmed.name(), "play-again-confirmed");
    }

    #[test]
    fn test_server_event_decodes_for_clients() {
        let event: ServerEvent = serde_json::from_value(json!({
            "event": "health-update",
            "data": { "health": { "4": 75 } }
        }))
        .unwrap();
        assert_eq!(
            event,
            ServerEvent::HealthUpdate {
                health: [(ClientId(4), 75)].into()
            }
        );
    }
}
