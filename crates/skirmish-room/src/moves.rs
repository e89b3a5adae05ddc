//! Sources of auto-moves.

use std::sync::Arc;

use rand::Rng;
use skirmish_protocol::Move;

/// Picks a move for a participant who did not submit one in time.
pub trait MoveSource: Send + 'static {
    fn pick(&mut self) -> Move;
}

/// Builds one [`MoveSource`] per room.
pub type MoveSourceFactory = Arc<dyn Fn() -> Box<dyn MoveSource> + Send + Sync>;

/// Uniform choice over the three moves.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomMoves;

impl RandomMoves {
    /// A factory handing every room its own [`RandomMoves`].
    pub fn factory() -> MoveSourceFactory {
        Arc::new(|| -> Box<dyn MoveSource> { Box::new(RandomMoves) })
    }
}

impl MoveSource for RandomMoves {
    fn pick(&mut self) -> Move {
        Move::ALL[rand::rng().random_range(0..Move::ALL.len())]
    }
}

/// Replays a fixed sequence of moves, cycling when it runs out.
///
/// An empty script always picks [`Move::Rock`].
#[derive(Debug, Clone)]
pub struct ScriptedMoves {
    script: Vec<Move>,
    next: usize,
}

impl ScriptedMoves {
    pub fn new(script: impl IntoIterator<Item = Move>) -> Self {
        Self {
            script: script.into_iter().collect(),
            next: 0,
        }
    }

    /// A factory giving every room a fresh copy of `script`.
    pub fn factory(script: impl IntoIterator<Item = Move>) -> MoveSourceFactory {
        let script: Vec<Move> = script.into_iter().collect();
        Arc::new(move || -> Box<dyn MoveSource> {
            Box::new(ScriptedMoves::new(script.clone()))
        })
    }
}

impl MoveSource for ScriptedMoves {
    fn pick(&mut self) -> Move {
        let Some(mv) = self.script.get(self.next % self.script.len().max(1)) else {
            return Move::Rock;
        };
        self.next += 1;
        *mv
    }
}
