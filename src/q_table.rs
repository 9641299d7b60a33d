use std::collections::HashMap;

use itertools::Itertools;

use crate::state::{Action, DiscreteState};

/// Learned (state, action) values. Unseen pairs read as 0.0.
#[derive(Debug, Clone, Default)]
pub struct QTable {
    values: HashMap<(DiscreteState, Action), f64>,
}

impl QTable {
    pub fn new() -> Self {
        QTable {
            values: HashMap::new(),
        }
    }

    pub fn get(&self, state: &DiscreteState, action: Action) -> f64 {
        self.values.get(&(*state, action)).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, state: DiscreteState, action: Action, value: f64) {
        self.values.insert((state, action), value);
    }

    /// Best value in `state` across every action, legal there or not.
    pub fn max_value(&self, state: &DiscreteState) -> f64 {
        Action::ALL
            .iter()
            .map(|&action| self.get(state, action))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// All actions in `candidates` sharing the highest value.
    pub fn best_actions(&self, state: &DiscreteState, candidates: &[Action]) -> Vec<Action> {
        candidates
            .iter()
            .copied()
            .max_set_by(|a, b| self.get(state, *a).total_cmp(&self.get(state, *b)))
    }

    /// `Q(s,a) += alpha * (reward + gamma * max Q(s',.) - Q(s,a))`
    pub fn q_learning_update(
        &mut self,
        state: DiscreteState,
        action: Action,
        reward: f64,
        next_state: &DiscreteState,
        learning_rate: f64,
        discount_factor: f64,
    ) -> f64 {
        let old = self.get(&state, action);
        let future = self.max_value(next_state);
        let updated = old + learning_rate * (reward + discount_factor * future - old);
        self.set(state, action, updated);
        updated
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(DiscreteState, Action), &f64)> {
        self.values.iter()
    }

    /// The `n` entries with the largest absolute value, largest first.
    pub fn top_by_magnitude(&self, n: usize) -> Vec<(DiscreteState, Action, f64)> {
        self.values
            .iter()
            .map(|(&(state, action), &value)| (state, action, value))
            .sorted_by(|a, b| {
                b.2.abs()
                    .total_cmp(&a.2.abs())
                    .then_with(|| (a.0, a.1).cmp(&(b.0, b.1)))
            })
            .take(n)
            .collect()
    }
}
