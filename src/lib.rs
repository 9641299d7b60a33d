//! Self-play Q-learning for turn-based 3v3 team battles.
//!
//! Two [`agent::Agent`]s, each with a roster of three characters, fight
//! turn by turn inside an [`engine::Battle`]. Every turn both sides pick one
//! of four actions, the engine resolves them under an initiative rule and
//! feeds the damage-based reward back into each agent's value table.

pub mod agent;
pub mod character;
pub mod config;
pub mod engine;
pub mod error;
pub mod players;
pub mod q_table;
pub mod state;
pub mod trainer;

pub use error::{Error, Result};
