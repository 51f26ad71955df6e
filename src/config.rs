use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable consulted when `--db` is not given
pub const DB_ENV_VAR: &str = "FLUID_DB";

const DB_FILE_NAME: &str = "fluid.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
}

impl Config {
    /// Resolve the database path from the command line, then `FLUID_DB`,
    /// then the per-user data directory
    pub fn load(cli_db: Option<PathBuf>) -> Result<Self> {
        let env_db = env::var_os(DB_ENV_VAR).map(PathBuf::from);
        Self::resolve(cli_db, env_db)
    }

    pub fn resolve(cli_db: Option<PathBuf>, env_db: Option<PathBuf>) -> Result<Self> {
        let db_path = match cli_db.or(env_db.filter(|p| !p.as_os_str().is_empty())) {
            Some(path) => path,
            None => default_db_path()?,
        };
        Ok(Self { db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

/// `<data dir>/fluid.db`, e.g. `~/.local/share/fluid-db/fluid.db` on Linux
pub fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "fluid-db")
        .context("Could not determine data directory")?;
    Ok(proj_dirs.data_dir().join(DB_FILE_NAME))
}
