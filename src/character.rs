use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Defended hits are halved, then rounded down to a multiple of ten.
const DEFEND_DIVISOR: i32 = 2;
const DAMAGE_GRANULARITY: i32 = 10;
pub const SUPER_COOLDOWN: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Archetype {
    Tank,
    Hybrid,
    Offensive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatProfile {
    pub max_health: i32,
    pub attack_damage: i32,
    pub super_damage: i32,
    pub speed: u32,
}

// Tank: high health, low damage, slow
// Hybrid: balanced
// Offensive: low health, high damage, fast
const PROFILES: [StatProfile; 3] = [
    StatProfile {
        max_health: 150,
        attack_damage: 15,
        super_damage: 30,
        speed: 6,
    },
    StatProfile {
        max_health: 100,
        attack_damage: 20,
        super_damage: 40,
        speed: 10,
    },
    StatProfile {
        max_health: 70,
        attack_damage: 25,
        super_damage: 50,
        speed: 14,
    },
];

impl Archetype {
    pub const ALL: [Archetype; 3] = [Archetype::Tank, Archetype::Hybrid, Archetype::Offensive];

    /// Position used in the discretized state.
    pub fn index(self) -> u8 {
        match self {
            Archetype::Tank => 0,
            Archetype::Hybrid => 1,
            Archetype::Offensive => 2,
        }
    }

    pub fn profile(self) -> StatProfile {
        PROFILES[self.index() as usize]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Archetype::Tank => "tank",
            Archetype::Hybrid => "hybrid",
            Archetype::Offensive => "offensive",
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Archetype::Tank => "Tank",
            Archetype::Hybrid => "Hybrid",
            Archetype::Offensive => "Offensive",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for Archetype {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tank" => Ok(Archetype::Tank),
            "hybrid" => Ok(Archetype::Hybrid),
            "offensive" => Ok(Archetype::Offensive),
            _ => Err(Error::UnknownArchetype {
                name: s.to_string(),
            }),
        }
    }
}

fn mitigate(damage: i32, target_defending: bool) -> i32 {
    if target_defending {
        (damage / DEFEND_DIVISOR) / DAMAGE_GRANULARITY * DAMAGE_GRANULARITY
    } else {
        damage
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    name: String,
    archetype: Archetype,
    profile: StatProfile,
    health: i32,
    cooldown: i32,
    is_defending: bool,
}

impl Character {
    pub fn new(archetype: Archetype, name: impl Into<String>) -> Self {
        let profile = archetype.profile();
        Character {
            name: name.into(),
            archetype,
            profile,
            health: profile.max_health,
            cooldown: SUPER_COOLDOWN,
            is_defending: false,
        }
    }

    /// Builds a character from an archetype name such as `"tank"`.
    pub fn from_kind(kind: &str, name: impl Into<String>) -> Result<Self> {
        Ok(Character::new(kind.parse()?, name))
    }

    fn hit(&self, target: &mut Character, base: i32) -> i32 {
        let damage = mitigate(base, target.is_defending);
        target.health = (target.health - damage).max(0);
        damage
    }

    pub fn attack(&mut self, target: &mut Character) -> i32 {
        let damage = self.hit(target, self.profile.attack_damage);
        self.cooldown -= 1;
        damage
    }

    /// Caller must check `cooldown() <= 0` first.
    pub fn super_attack(&mut self, target: &mut Character) -> i32 {
        debug_assert!(self.cooldown <= 0, "super attack used on cooldown");
        let damage = self.hit(target, self.profile.super_damage);
        self.cooldown = SUPER_COOLDOWN;
        damage
    }

    pub fn defend(&mut self) -> bool {
        self.cooldown -= 1;
        self.is_defending = true;
        true
    }

    pub fn reset_turn(&mut self) {
        self.is_defending = false;
    }

    pub fn reset_for_battle(&mut self) {
        self.health = self.profile.max_health;
        self.is_defending = false;
        self.cooldown = SUPER_COOLDOWN;
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn can_super_attack(&self) -> bool {
        self.cooldown <= 0
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn archetype(&self) -> Archetype {
        self.archetype
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn max_health(&self) -> i32 {
        self.profile.max_health
    }

    pub fn cooldown(&self) -> i32 {
        self.cooldown
    }

    pub fn speed(&self) -> u32 {
        self.profile.speed
    }

    pub fn attack_damage(&self) -> i32 {
        self.profile.attack_damage
    }

    pub fn super_damage(&self) -> i32 {
        self.profile.super_damage
    }

    pub fn is_defending(&self) -> bool {
        self.is_defending
    }
}

impl fmt::Display for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}, HP={}/{})",
            self.archetype,
            self.name,
            self.health,
            self.profile.max_health
        )
    }
}
