//! Identifiers and value types shared by every layer.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use skirmish_transport::ConnectionId;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque identifier of one connected participant.
///
/// Derived from the transport's [`ConnectionId`]; a reconnecting client
/// gets a new one. Serialized as a plain number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

impl From<ConnectionId> for ClientId {
    fn from(id: ConnectionId) -> Self {
        Self(id.into_inner())
    }
}

/// Caller-chosen room name. Case-sensitive and unvalidated: `"R1"` and
/// `"r1"` are different rooms, and the empty string is a valid name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomName(pub String);

impl RoomName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for RoomName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

// ---------------------------------------------------------------------------
// Move
// ---------------------------------------------------------------------------

/// One of the three hand shapes.
///
/// Serialized as `"rock"`, `"paper"`, `"scissors"`. The Spanish tokens
/// used by the first web client (`"piedra"`, `"papel"`, `"tijera"`) are
/// accepted on input. Any other token fails to decode, so an unknown move
/// never reaches the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    #[serde(alias = "piedra")]
    Rock,
    #[serde(alias = "papel")]
    Paper,
    #[serde(alias = "tijera")]
    Scissors,
}

impl Move {
    /// All moves, in a fixed order. Random move sources index into this.
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    /// Returns `true` if `self` wins against `other`.
    pub fn beats(self, other: Move) -> bool {
        matches!(
            (self, other),
            (Move::Rock, Move::Scissors)
                | (Move::Paper, Move::Rock)
                | (Move::Scissors, Move::Paper)
        )
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rock => f.write_str("rock"),
            Self::Paper => f.write_str("paper"),
            Self::Scissors => f.write_str("scissors"),
        }
    }
}

// ---------------------------------------------------------------------------
// Health and match outcome
// ---------------------------------------------------------------------------

/// Health per participant, ordered by id so broadcasts are stable.
pub type HealthMap = BTreeMap<ClientId, u8>;

/// How a match ended.
///
/// On the wire the winner is either the surviving client's id or the
/// string `"tie"` when everybody dropped to zero in the same round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    /// Exactly one participant is still alive.
    Winner(ClientId),
    /// Every participant is at zero health.
    Tie,
}

const TIE: &str = "tie";

impl Serialize for GameOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Winner(id) => id.serialize(serializer),
            Self::Tie => serializer.serialize_str(TIE),
        }
    }
}

impl<'de> Deserialize<'de> for GameOutcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Id(ClientId),
            Word(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Id(id) => Ok(Self::Winner(id)),
            Repr::Word(word) if word == TIE => Ok(Self::Tie),
            Repr::Word(other) => Err(serde::de::Error::custom(format!(
                "expected a client id or \"{TIE}\", got \"{other}\""
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who a server event is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every participant currently in the room.
    Room,
    /// A single participant.
    Client(ClientId),
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Top-level frame. Every message on the wire is an `Envelope`.
///
/// `seq` and `timestamp` are stamped by the sender. The server numbers
/// its outbound frames per connection, starting at 1, and stamps
/// milliseconds since the server started. Clients may omit both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<E> {
    #[serde(default)]
    pub seq: u64,
    #[serde(default)]
    pub timestamp: u64,
    pub payload: E,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&ClientId(42)).unwrap(), "42");
    }

    #[test]
    fn test_client_id_from_connection_id() {
        assert_eq!(ClientId::from(ConnectionId::new(5)), ClientId(5));
        assert_eq!(ClientId(5).to_string(), "C-5");
    }

    #[test]
    fn test_room_name_is_case_sensitive() {
        assert_ne!(RoomName::from("Lobby"), RoomName::from("lobby"));
        assert_eq!(serde_json::to_string(&RoomName::from("r1")).unwrap(), "\"r1\"");
    }

    #[test]
    fn test_beats_relation() {
        assert!(Move::Rock.beats(Move::Scissors));
        assert!(Move::Paper.beats(Move::Rock));
        assert!(Move::Scissors.beats(Move::Paper));

        assert!(!Move::Scissors.beats(Move::Rock));
        for m in Move::ALL {
            assert!(!m.beats(m), "{m} must not beat itself");
        }
    }

    #[test]
    fn test_move_accepts_spanish_aliases() {
        let m: Move = serde_json::from_str("\"piedra\"").unwrap();
        assert_eq!(m, Move::Rock);
        let m: Move = serde_json::from_str("\"tijera\"").unwrap();
        assert_eq!(m, Move::Scissors);

        // Output always uses the English token.
        assert_eq!(serde_json::to_string(&Move::Paper).unwrap(), "\"paper\"");
    }

    #[test]
    fn test_move_rejects_unknown_token() {
        assert!(serde_json::from_str::<Move>("\"lizard\"").is_err());
        assert!(serde_json::from_str::<Move>("\"Rock\"").is_err());
    }

    #[test]
    fn test_health_map_uses_string_keys_in_json() {
        let health: HealthMap = [(ClientId(1), 100), (ClientId(2), 80)].into();
        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json, serde_json::json!({ "1": 100, "2": 80 }));

        let back: HealthMap = serde_json::from_value(json).unwrap();
        assert_eq!(back, health);
    }

    #[test]
    fn test_game_outcome_wire_format() {
        assert_eq!(
            serde_json::to_value(GameOutcome::Winner(ClientId(7))).unwrap(),
            serde_json::json!(7)
        );
        assert_eq!(
            serde_json::to_value(GameOutcome::Tie).unwrap(),
            serde_json::json!("tie")
        );

        let tie: GameOutcome = serde_json::from_str("\"tie\"").unwrap();
        assert_eq!(tie, GameOutcome::Tie);
        assert!(serde_json::from_str::<GameOutcome>("\"draw\"").is_err());
    }

    #[test]
    fn test_envelope_seq_and_timestamp_default_when_missing() {
        let env: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{ "payload": null }"#).unwrap();
        assert_eq!(env.seq, 0);
        assert_eq!(env.timestamp, 0);
    }
}
