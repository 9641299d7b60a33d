use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use battle_q::config::{OpponentKind, TrainerConfig};
use battle_q::engine::InitiativeMode;
use battle_q::trainer;

/// Train two Q-learning teams against each other.
#[derive(Parser, Debug)]
#[command(name = "trainer", version, long_about = None)]
struct Args {
    /// TOML file with training settings; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    episodes: Option<usize>,

    #[arg(long)]
    max_turns: Option<u32>,

    #[arg(long)]
    print_every: Option<usize>,

    #[arg(short, long, value_enum)]
    initiative: Option<InitiativeMode>,

    #[arg(short, long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    opponent: Option<OpponentKind>,

    /// Number of learned values to show per agent
    #[arg(long)]
    top: Option<usize>,
}

impl Args {
    fn into_config(self) -> Result<TrainerConfig> {
        let mut config = match &self.config {
            Some(path) => TrainerConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => TrainerConfig::default(),
        };
        if let Some(episodes) = self.episodes {
            config.episodes = episodes;
        }
        if let Some(max_turns) = self.max_turns {
            config.max_turns = max_turns;
        }
        if let Some(print_every) = self.print_every {
            config.print_every = print_every;
        }
        if let Some(initiative) = self.initiative {
            config.initiative = initiative;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(opponent) = self.opponent {
            config.opponent = opponent;
        }
        if let Some(top) = self.top {
            config.top_n = top;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("battle_q=info")))
        .init();

    let config = Args::parse().into_config()?;
    let report = trainer::train(&config).context("training failed")?;
    print!("{}", report);
    Ok(())
}
