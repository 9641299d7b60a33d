//! Episode loop around [`Battle`]: resets, steps until a team falls or the
//! turn cap hits, keeps the scoreboard and collects what the learners found.

use std::fmt;

use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::agent::Agent;
use crate::config::{build_team, OpponentKind, TrainerConfig};
use crate::engine::{Battle, InitiativeMode, Winner};
use crate::error::Result;
use crate::players::{BattleRng, Player, QLearningPlayer, RandomPlayer};
use crate::state::{Action, DiscreteState};

const LOG_TAIL: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scoreboard {
    pub wins_a: usize,
    pub wins_b: usize,
    pub draws: usize,
}

impl Scoreboard {
    /// Unfinished episodes count as draws.
    pub fn record(&mut self, winner: Option<Winner>) {
        match winner {
            Some(Winner::A) => self.wins_a += 1,
            Some(Winner::B) => self.wins_b += 1,
            Some(Winner::Draw) | None => self.draws += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.wins_a + self.wins_b + self.draws
    }

    /// Percentages for A and B.
    pub fn win_rates(&self) -> (f64, f64) {
        let total = self.total();
        if total == 0 {
            return (0.0, 0.0);
        }
        (
            100.0 * self.wins_a as f64 / total as f64,
            100.0 * self.wins_b as f64 / total as f64,
        )
    }
}

pub type LearnedValue = (DiscreteState, Action, f64);

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub episodes: usize,
    pub initiative: InitiativeMode,
    pub team_a: String,
    pub team_b: String,
    pub scoreboard: Scoreboard,
    /// Episodes stopped by the turn cap.
    pub capped: usize,
    pub table_size_a: usize,
    pub table_size_b: Option<usize>,
    pub top_a: Vec<LearnedValue>,
    pub top_b: Option<Vec<LearnedValue>>,
    pub last_episode_log: Vec<String>,
}

pub fn train(config: &TrainerConfig) -> Result<TrainingReport> {
    config.validate()?;

    let seed = config.seed.unwrap_or_else(rand::random);
    let mut seeds = BattleRng::seed_from_u64(seed);
    debug!(seed, "seeding training run");

    let agent_a = Agent::new(
        build_team(&config.team_a, "A")?,
        config.agent_a.build_player()?,
        seeds.gen(),
    )?;
    let team_b = build_team(&config.team_b, "B")?;

    match config.opponent {
        OpponentKind::Learning => {
            let agent_b = Agent::new(team_b, config.agent_b.build_player()?, seeds.gen())?;
            Ok(run(config, Battle::new(agent_a, agent_b, config.initiative, seeds.gen())))
        }
        OpponentKind::Random => {
            let agent_b = Agent::new(team_b, RandomPlayer {}, seeds.gen())?;
            Ok(run(config, Battle::new(agent_a, agent_b, config.initiative, seeds.gen())))
        }
    }
}

/// Plays one episode. Returns the winner, or `None` if the turn cap was hit.
pub fn play_episode<A: Player, B: Player>(battle: &mut Battle<A, B>, max_turns: u32) -> Option<Winner> {
    battle.reset_episode();
    for _ in 0..max_turns {
        if !battle.step() {
            break;
        }
    }
    battle.winner()
}

fn run<B: Player>(config: &TrainerConfig, mut battle: Battle<QLearningPlayer, B>) -> TrainingReport {
    let mut scoreboard = Scoreboard::default();
    let mut capped = 0;

    info!(
        episodes = config.episodes,
        initiative = %config.initiative,
        team_a = %battle.agent_a().roster_summary(),
        team_b = %battle.agent_b().roster_summary(),
        opponent = battle.agent_b().player().name(),
        "starting training"
    );

    for episode in 0..config.episodes {
        let winner = play_episode(&mut battle, config.max_turns);
        if winner.is_none() {
            capped += 1;
            debug!(episode, turns = battle.turn(), "episode hit the turn cap");
        }
        scoreboard.record(winner);

        if config.print_every > 0 && episode % config.print_every == 0 {
            let log = battle.actions_log();
            for line in &log[log.len().saturating_sub(LOG_TAIL)..] {
                info!("  {}", line);
            }
            let (rate_a, rate_b) = scoreboard.win_rates();
            info!(
                episode,
                winner = winner.map_or("draw", Winner::as_str),
                wins_a = scoreboard.wins_a,
                wins_b = scoreboard.wins_b,
                draws = scoreboard.draws,
                "win rate A={:.1}% B={:.1}%",
                rate_a,
                rate_b
            );
        }
    }

    let table_a = battle.agent_a().player().table();
    let table_b = battle.agent_b().q_table();
    TrainingReport {
        episodes: config.episodes,
        initiative: config.initiative,
        team_a: battle.agent_a().roster_summary(),
        team_b: battle.agent_b().roster_summary(),
        scoreboard,
        capped,
        table_size_a: table_a.len(),
        table_size_b: table_b.map(|t| t.len()),
        top_a: table_a.top_by_magnitude(config.top_n),
        top_b: table_b.map(|t| t.top_by_magnitude(config.top_n)),
        last_episode_log: battle.actions_log().to_vec(),
    }
}

fn write_top(f: &mut fmt::Formatter<'_>, label: &str, values: &[LearnedValue]) -> fmt::Result {
    writeln!(f, "{}", "-".repeat(40))?;
    writeln!(f, "TOP {} Q-VALUES (Agent {}):", values.len(), label)?;
    writeln!(f, "{}", "-".repeat(40))?;
    for (state, action, value) in values {
        writeln!(f, "  State {}, action '{}': {:.2}", state, action, value)?;
    }
    Ok(())
}

impl fmt::Display for TrainingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "FINAL RESULTS")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Team A: [{}]", self.team_a)?;
        writeln!(f, "Team B: [{}]", self.team_b)?;
        writeln!(f, "Episodes: {} (initiative: {})", self.episodes, self.initiative)?;
        writeln!(f)?;
        writeln!(f, "Agent A wins: {}", self.scoreboard.wins_a)?;
        writeln!(f, "Agent B wins: {}", self.scoreboard.wins_b)?;
        writeln!(f, "Draws: {} ({} hit the turn cap)", self.scoreboard.draws, self.capped)?;
        let (rate_a, rate_b) = self.scoreboard.win_rates();
        writeln!(f, "Final win rate: A={:.1}% | B={:.1}%", rate_a, rate_b)?;
        writeln!(f)?;
        writeln!(f, "Learned entries Agent A: {}", self.table_size_a)?;
        if let Some(size) = self.table_size_b {
            writeln!(f, "Learned entries Agent B: {}", size)?;
        }
        writeln!(f)?;
        write_top(f, "A", &self.top_a)?;
        if let Some(top_b) = &self.top_b {
            write_top(f, "B", top_b)?;
        }
        Ok(())
    }
}
