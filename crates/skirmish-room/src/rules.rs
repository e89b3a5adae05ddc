//! Round resolution and elimination.
//!
//! Pure functions over moves and health; the room actor decides when to
//! call them.

use skirmish_protocol::{ClientId, GameOutcome, HealthMap, PlayerMove};

/// A duel has exactly two participants. Rounds resolve pairwise, so a
/// room never admits more.
pub const MAX_PLAYERS: usize = 2;

/// Health every participant starts a match with.
pub const MAX_HEALTH: u8 = 100;

/// Damage each participant takes when both played the same move.
pub const TIE_DAMAGE: u8 = 5;

/// Damage the loser of a round takes.
pub const LOSS_DAMAGE: u8 = 20;

/// Outcome of a round between exactly two participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundResult {
    /// Both moves, in submission order.
    pub players: [PlayerMove; 2],
    /// `None` on equal moves.
    pub winner: Option<ClientId>,
    /// Damage applied: [`TIE_DAMAGE`] to both, or [`LOSS_DAMAGE`] to the loser.
    pub damage: u8,
}

impl RoundResult {
    /// The participant that lost the round, if any.
    pub fn loser(&self) -> Option<ClientId> {
        let winner = self.winner?;
        self.players.iter().map(|p| p.id).find(|id| *id != winner)
    }
}

/// Decide a round between two moves.
pub fn resolve(first: PlayerMove, second: PlayerMove) -> RoundResult {
    let winner = if first.mv == second.mv {
        None
    } else if first.mv.beats(second.mv) {
        Some(first.id)
    } else {
        Some(second.id)
    };

    RoundResult {
        players: [first, second],
        winner,
        damage: if winner.is_some() { LOSS_DAMAGE } else { TIE_DAMAGE },
    }
}

/// Apply a round's damage to the health pool, flooring at zero.
///
/// Participants missing from `health` are skipped.
pub fn apply_damage(health: &mut HealthMap, result: &RoundResult) {
    let hit: Vec<ClientId> = match result.loser() {
        Some(loser) => vec![loser],
        None => result.players.iter().map(|p| p.id).collect(),
    };

    for id in hit {
        if let Some(hp) = health.get_mut(&id) {
            *hp = hp.saturating_sub(result.damage);
        }
    }
}

/// Evaluate elimination.
///
/// Returns the single survivor, [`GameOutcome::Tie`] when every
/// participant is at zero, or `None` while two or more are still alive.
/// An empty pool is undecided.
pub fn check_game_over(health: &HealthMap) -> Option<GameOutcome> {
    let mut alive = health.iter().filter(|(_, hp)| **hp > 0).map(|(id, _)| *id);

    match (alive.next(), alive.next()) {
        (Some(survivor), None) => Some(GameOutcome::Winner(survivor)),
        (None, _) if !health.is_empty() => Some(GameOutcome::Tie),
        _ => None,
    }
}
