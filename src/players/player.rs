use rand_xoshiro::SplitMix64;

use crate::q_table::QTable;
use crate::state::{Action, DiscreteState};

/// Every random draw in a battle goes through this generator so seeded runs replay exactly.
pub type BattleRng = SplitMix64;

pub trait Player {
    /// `allowed` is never empty and always contains `Action::Attack`.
    fn choose_action(
        &self,
        state: &DiscreteState,
        allowed: &[Action],
        rng: &mut BattleRng,
    ) -> Action;

    fn learn(
        &mut self,
        _state: DiscreteState,
        _action: Action,
        _reward: f64,
        _next_state: &DiscreteState,
    ) {
    }

    fn q_table(&self) -> Option<&QTable> {
        None
    }

    fn name(&self) -> &str;
}
