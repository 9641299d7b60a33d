use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Error, Result};
use crate::players::player::{BattleRng, Player};
use crate::q_table::QTable;
use crate::state::{Action, DiscreteState};

/// Epsilon-greedy tabular Q-learner.
#[derive(Debug, Clone)]
pub struct QLearningPlayer {
    q_table: QTable,
    learning_rate: f64,
    discount_factor: f64,
    exploration_rate: f64,
}

fn check_unit(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(Error::InvalidHyperparameter { name, value })
    }
}

impl Default for QLearningPlayer {
    fn default() -> Self {
        QLearningPlayer::new(0.1, 0.9, 0.2)
    }
}

impl Player for QLearningPlayer {
    fn choose_action(
        &self,
        state: &DiscreteState,
        allowed: &[Action],
        rng: &mut BattleRng,
    ) -> Action {
        if rng.gen::<f64>() < self.exploration_rate {
            return *allowed.choose(rng).unwrap_or(&Action::Attack);
        }

        let best = self.q_table.best_actions(state, allowed);
        *best.choose(rng).unwrap_or(&Action::Attack)
    }

    fn learn(
        &mut self,
        state: DiscreteState,
        action: Action,
        reward: f64,
        next_state: &DiscreteState,
    ) {
        self.q_table.q_learning_update(
            state,
            action,
            reward,
            next_state,
            self.learning_rate,
            self.discount_factor,
        );
    }

    fn q_table(&self) -> Option<&QTable> {
        Some(&self.q_table)
    }

    fn name(&self) -> &str {
        "q-learning"
    }
}

impl QLearningPlayer {
    pub fn new(learning_rate: f64, discount_factor: f64, exploration_rate: f64) -> Self {
        QLearningPlayer {
            q_table: QTable::new(),
            learning_rate,
            discount_factor,
            exploration_rate,
        }
    }

    /// Same as `new`, rejecting values outside `[0, 1]`.
    pub fn try_new(learning_rate: f64, discount_factor: f64, exploration_rate: f64) -> Result<Self> {
        Ok(QLearningPlayer::new(
            check_unit("alpha", learning_rate)?,
            check_unit("gamma", discount_factor)?,
            check_unit("epsilon", exploration_rate)?,
        ))
    }

    pub fn set_alpha(&mut self, alpha: f64) {
        self.learning_rate = alpha;
    }

    pub fn set_gamma(&mut self, gamma: f64) {
        self.discount_factor = gamma;
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.exploration_rate = epsilon;
    }

    pub fn alpha(&self) -> f64 {
        self.learning_rate
    }

    pub fn gamma(&self) -> f64 {
        self.discount_factor
    }

    pub fn epsilon(&self) -> f64 {
        self.exploration_rate
    }

    pub fn table(&self) -> &QTable {
        &self.q_table
    }

    pub fn table_mut(&mut self) -> &mut QTable {
        &mut self.q_table
    }
}
