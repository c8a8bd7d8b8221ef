use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the database location
pub const DB_ENV_VAR: &str = "GOLF_SCORING_DB";

const DB_FILE_NAME: &str = "golf.sqlite";

/// Where the database file lives
pub struct DataLocation {
    db_path: PathBuf,
}

impl DataLocation {
    /// Use `custom` when given, otherwise the platform data directory
    pub fn new(custom: Option<PathBuf>) -> Result<Self> {
        let db_path = match custom {
            Some(path) => path,
            None => {
                let proj_dirs = ProjectDirs::from("", "", "golf-scoring-db")
                    .context("Could not determine data directory")?;
                proj_dirs.data_dir().join(DB_FILE_NAME)
            }
        };

        Ok(Self { db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}
