use rand::seq::SliceRandom;

use crate::players::player::{BattleRng, Player};
use crate::state::{Action, DiscreteState};

/// Uniform choice over the allowed actions. Never learns.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPlayer {}

impl Player for RandomPlayer {
    fn choose_action(
        &self,
        _state: &DiscreteState,
        allowed: &[Action],
        rng: &mut BattleRng,
    ) -> Action {
        *allowed.choose(rng).unwrap_or(&Action::Attack)
    }

    fn name(&self) -> &str {
        "random"
    }
}
