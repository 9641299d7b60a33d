pub mod player;
pub mod qlearning_player;
pub mod random_player;

pub use player::{BattleRng, Player};
pub use qlearning_player::QLearningPlayer;
pub use random_player::RandomPlayer;
