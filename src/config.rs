//! Training configuration, loadable from TOML and overridable from the CLI.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::agent::TEAM_SIZE;
use crate::character::{Archetype, Character};
use crate::engine::InitiativeMode;
use crate::error::{Error, Result};
use crate::players::QLearningPlayer;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.95,
            epsilon: 0.05,
        }
    }
}

impl Hyperparameters {
    pub fn build_player(&self) -> Result<QLearningPlayer> {
        QLearningPlayer::try_new(self.alpha, self.gamma, self.epsilon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OpponentKind {
    /// A second Q-learning agent (self-play)
    Learning,
    /// Uniformly random legal actions
    Random,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub episodes: usize,
    /// Turn cap per episode.
    pub max_turns: u32,
    /// Progress is logged every `print_every` episodes.
    pub print_every: usize,
    pub initiative: InitiativeMode,
    pub seed: Option<u64>,
    pub opponent: OpponentKind,
    pub team_a: Vec<String>,
    pub team_b: Vec<String>,
    pub agent_a: Hyperparameters,
    pub agent_b: Hyperparameters,
    /// How many learned values to report per agent.
    pub top_n: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            episodes: 100_000,
            max_turns: 100,
            print_every: 500,
            initiative: InitiativeMode::Probabilistic,
            seed: None,
            opponent: OpponentKind::Learning,
            team_a: vec!["offensive".into(), "hybrid".into(), "tank".into()],
            team_b: vec!["tank".into(), "offensive".into(), "hybrid".into()],
            agent_a: Hyperparameters::default(),
            agent_b: Hyperparameters::default(),
            top_n: 10,
        }
    }
}

impl TrainerConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read config {}", path.display()),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.episodes == 0 {
            return Err(Error::InvalidConfiguration {
                message: "episodes must be at least 1".into(),
            });
        }
        if self.max_turns == 0 {
            return Err(Error::InvalidConfiguration {
                message: "max_turns must be at least 1".into(),
            });
        }
        build_team(&self.team_a, "A")?;
        build_team(&self.team_b, "B")?;
        self.agent_a.build_player()?;
        self.agent_b.build_player()?;
        Ok(())
    }
}

/// Builds a roster from archetype names, naming members like `Tank_A`.
pub fn build_team(kinds: &[String], side: &str) -> Result<Vec<Character>> {
    if kinds.len() != TEAM_SIZE {
        return Err(Error::RosterSize {
            expected: TEAM_SIZE,
            got: kinds.len(),
        });
    }
    kinds
        .iter()
        .map(|kind| -> Result<Character> {
            let archetype: Archetype = kind.parse()?;
            Ok(Character::new(archetype, format!("{}_{}", archetype, side)))
        })
        .collect()
}
