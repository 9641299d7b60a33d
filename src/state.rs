//! Discrete state and action space shared by agents and the value table.

use std::fmt;

use crate::character::Character;

pub const HEALTH_BUCKETS: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Attack,
    Defend,
    SuperAttack,
    Switch,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::Attack,
        Action::Defend,
        Action::SuperAttack,
        Action::Switch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Attack => "attack",
            Action::Defend => "defend",
            Action::SuperAttack => "super_attack",
            Action::Switch => "switch",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health ratio scaled to `0..=HEALTH_BUCKETS`, rounded down.
pub fn discretize(health: i32, max_health: i32) -> u8 {
    if max_health <= 0 {
        return 0;
    }
    let bucket = health as i64 * HEALTH_BUCKETS as i64 / max_health as i64;
    bucket.clamp(0, HEALTH_BUCKETS as i64) as u8
}

/// Value-table key describing a matchup from one side's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiscreteState {
    pub own_health: u8,
    pub enemy_health: u8,
    pub own_archetype: u8,
    pub enemy_archetype: u8,
    pub own_alive: u8,
    pub enemy_alive: u8,
}

impl DiscreteState {
    pub fn from_matchup(
        own: &Character,
        enemy: &Character,
        own_alive: usize,
        enemy_alive: usize,
    ) -> Self {
        DiscreteState {
            own_health: discretize(own.health(), own.max_health()),
            enemy_health: discretize(enemy.health(), enemy.max_health()),
            own_archetype: own.archetype().index(),
            enemy_archetype: enemy.archetype().index(),
            own_alive: own_alive as u8,
            enemy_alive: enemy_alive as u8,
        }
    }
}

impl fmt::Display for DiscreteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {}, {})",
            self.own_health,
            self.enemy_health,
            self.own_archetype,
            self.enemy_archetype,
            self.own_alive,
            self.enemy_alive
        )
    }
}
