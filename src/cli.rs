use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

use crate::config::DB_ENV_VAR;
use crate::models::TournamentStatus;

#[derive(Parser, Debug)]
#[command(name = "golf-scoring-db")]
#[command(version, about = "Manage a golf tournament scoring database")]
pub struct Cli {
    /// SQLite database path (defaults to the platform data directory)
    #[arg(long, global = true, env = DB_ENV_VAR)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or upgrade the schema and seed default settings
    Init,

    /// List tables in creation order with what a delete cascades to
    Tables,

    /// Manage players
    #[command(subcommand)]
    Player(PlayerCommand),

    /// Manage tournaments
    #[command(subcommand)]
    Tournament(TournamentCommand),

    /// Manage a tournament's holes
    #[command(subcommand)]
    Hole(HoleCommand),

    /// Enter a player into a tournament
    Enter {
        tournament: Uuid,
        player: Uuid,
    },

    /// Manage groups and their members
    #[command(subcommand)]
    Group(GroupCommand),

    /// Record and list scores
    #[command(subcommand)]
    Score(ScoreCommand),

    /// Read and change app settings
    #[command(subcommand)]
    Setting(SettingCommand),

    /// Show the leaderboard (of the active tournament by default)
    Leaderboard {
        tournament: Option<Uuid>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum PlayerCommand {
    /// Add a player
    Add {
        name: String,

        /// Handicap index (negative for plus handicaps)
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        handicap: f64,

        /// Official handicap reference
        #[arg(long)]
        reference: Option<String>,
    },

    /// List all players
    List,

    /// Delete a player and everything recorded for them
    Delete { id: Uuid },
}

#[derive(Args, Debug)]
pub struct NewTournamentArgs {
    pub name: String,

    #[arg(long)]
    pub year: i32,

    #[arg(long)]
    pub course: String,

    #[arg(long, default_value_t = 113.0)]
    pub slope: f64,

    #[arg(long, default_value_t = 72.0)]
    pub rating: f64,

    /// First day (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Make this the active tournament
    #[arg(long)]
    pub active: bool,
}

#[derive(Subcommand, Debug)]
pub enum TournamentCommand {
    /// Add a tournament
    Add(NewTournamentArgs),

    /// List tournaments
    List,

    /// Make a tournament the single active one
    Activate { id: Uuid },

    /// Clear a tournament's active flag
    Deactivate { id: Uuid },

    /// Set status: upcoming, active or completed
    Status { id: Uuid, status: TournamentStatus },

    /// Delete a tournament with its holes, groups, entries and scores
    Delete { id: Uuid },
}

#[derive(Subcommand, Debug)]
pub enum HoleCommand {
    /// Add one hole
    Add {
        tournament: Uuid,
        number: u8,
        par: u8,
        stroke_index: u8,
    },

    /// Add consecutive holes from 1, all or nothing
    Bulk {
        tournament: Uuid,

        /// Par of each hole, comma-separated
        #[arg(long, value_delimiter = ',', required = true)]
        pars: Vec<u8>,

        /// Stroke index of each hole, comma-separated
        #[arg(long, value_delimiter = ',', required = true)]
        stroke_indexes: Vec<u8>,
    },

    /// List a tournament's holes
    List { tournament: Uuid },
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// Add a group to a tournament
    Add {
        tournament: Uuid,
        number: u32,

        #[arg(long)]
        name: Option<String>,

        /// Tee time (HH:MM:SS)
        #[arg(long)]
        tee_time: Option<NaiveTime>,

        /// Join code; generated when omitted
        #[arg(long)]
        pin: Option<String>,
    },

    /// List a tournament's groups
    List { tournament: Uuid },

    /// Put a player in a group
    Join {
        group: Uuid,
        player: Uuid,

        /// Make the player the group's scorer
        #[arg(long)]
        scorer: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ScoreCommand {
    /// Record a gross score for a hole
    Record {
        tournament: Uuid,
        player: Uuid,
        hole_number: u8,
        gross: u32,

        /// Overwrite an existing score for the hole
        #[arg(long)]
        replace: bool,
    },

    /// List a tournament's scores, or one player's card
    List {
        tournament: Uuid,

        #[arg(long)]
        player: Option<Uuid>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingCommand {
    /// Print a setting's value
    Get { key: String },

    /// Set a setting's value
    Set { key: String, value: String },

    /// List all settings
    List,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
