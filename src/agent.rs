//! A team of three characters driven by a [`Player`].
//!
//! The agent owns the roster, tracks which member is active and holds the
//! random source used both for the player's decisions and for picking a
//! switch target.

use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::character::Character;
use crate::error::{Error, Result};
use crate::players::{BattleRng, Player, QLearningPlayer};
use crate::q_table::QTable;
use crate::state::{Action, DiscreteState};

pub const TEAM_SIZE: usize = 3;

#[derive(Debug, Clone)]
pub struct Agent<P = QLearningPlayer> {
    team: [Character; TEAM_SIZE],
    active_index: usize,
    player: P,
    rng: BattleRng,
}

impl<P: Player> Agent<P> {
    pub fn new(team: Vec<Character>, player: P, seed: u64) -> Result<Self> {
        let got = team.len();
        let team: [Character; TEAM_SIZE] = team.try_into().map_err(|_| Error::RosterSize {
            expected: TEAM_SIZE,
            got,
        })?;

        Ok(Agent {
            team,
            active_index: 0,
            player,
            rng: BattleRng::seed_from_u64(seed),
        })
    }

    pub fn active(&self) -> &Character {
        &self.team[self.active_index]
    }

    pub fn active_mut(&mut self) -> &mut Character {
        &mut self.team[self.active_index]
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn team(&self) -> &[Character] {
        &self.team
    }

    pub fn team_mut(&mut self) -> &mut [Character] {
        &mut self.team
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn q_table(&self) -> Option<&QTable> {
        self.player.q_table()
    }

    /// Living members other than the active one, as roster indices.
    pub fn bench(&self) -> Vec<usize> {
        (0..TEAM_SIZE)
            .filter(|&i| i != self.active_index && self.team[i].is_alive())
            .collect()
    }

    pub fn count_alive(&self) -> usize {
        self.team.iter().filter(|c| c.is_alive()).count()
    }

    pub fn has_switch_available(&self) -> bool {
        !self.bench().is_empty()
    }

    pub fn get_state<Q: Player>(&self, enemy: &Agent<Q>) -> DiscreteState {
        DiscreteState::from_matchup(
            self.active(),
            enemy.active(),
            self.count_alive(),
            enemy.count_alive(),
        )
    }

    pub fn get_allowed_actions(&self) -> Vec<Action> {
        let mut allowed = vec![Action::Attack, Action::Defend];
        if self.active().can_super_attack() {
            allowed.push(Action::SuperAttack);
        }
        if self.has_switch_available() {
            allowed.push(Action::Switch);
        }
        allowed
    }

    pub fn choose_action<Q: Player>(&mut self, enemy: &Agent<Q>) -> Action {
        let state = self.get_state(enemy);
        let allowed = self.get_allowed_actions();
        self.player.choose_action(&state, &allowed, &mut self.rng)
    }

    pub fn choose_switch_target(&mut self) -> Option<usize> {
        self.bench().choose(&mut self.rng).copied()
    }

    /// Makes `target_index` active if it is a valid, living roster slot.
    pub fn perform_switch(&mut self, target_index: Option<usize>) -> bool {
        let target_index = match target_index.or_else(|| self.choose_switch_target()) {
            Some(index) => index,
            None => return false,
        };
        if target_index >= TEAM_SIZE || !self.team[target_index].is_alive() {
            return false;
        }
        self.active_index = target_index;
        true
    }

    /// Returns false only when the whole team is down.
    pub fn force_switch_if_fainted(&mut self) -> bool {
        if self.active().is_alive() {
            return true;
        }
        match self.team.iter().position(|c| c.is_alive()) {
            Some(index) => {
                self.active_index = index;
                true
            }
            None => false,
        }
    }

    pub fn update_q(
        &mut self,
        state: DiscreteState,
        action: Action,
        reward: f64,
        next_state: &DiscreteState,
    ) {
        self.player.learn(state, action, reward, next_state);
    }

    pub fn all_fainted(&self) -> bool {
        self.team.iter().all(|c| !c.is_alive())
    }

    pub fn reset_turn(&mut self) {
        for character in self.team.iter_mut() {
            character.reset_turn();
        }
    }

    pub fn reset_for_episode(&mut self) {
        self.active_index = 0;
        for character in self.team.iter_mut() {
            character.reset_for_battle();
        }
    }

    pub fn roster_summary(&self) -> String {
        self.team.iter().map(|c| c.archetype().as_str()).join(", ")
    }
}

impl Agent<QLearningPlayer> {
    pub fn set_alpha(&mut self, alpha: f64) {
        self.player.set_alpha(alpha);
    }

    pub fn set_gamma(&mut self, gamma: f64) {
        self.player.set_gamma(gamma);
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.player.set_epsilon(epsilon);
    }
}
