pub mod cli;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod models;
pub mod schema;
pub mod store;
pub mod validation;

pub use cli::{Cli, Commands};
pub use error::{Result, StoreError};
pub use leaderboard::{Leaderboard, LeaderboardRow};
pub use store::Database;
