//! NovaBridge Database - read-only access to the Sonar preset store.
//!
//! SteelSeries GG keeps Sonar's EQ presets in a SQLite file owned by the
//! running application. This crate never writes to it: each query opens the
//! file read-only, runs one parameterized statement, and closes it again so
//! the vendor process keeps full control of the database.

pub mod error;
pub mod queries;

pub use error::{DbError, DbResult};

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

/// Location of the Sonar database relative to the program data directory.
const SONAR_DB_RELATIVE_PATH: &str = "SteelSeries/GG/apps/sonar/db/database.db";

/// Handle on the Sonar preset database.
#[derive(Debug, Clone)]
pub struct PresetDatabase {
    path: PathBuf,
}

impl PresetDatabase {
    /// Use the database at `path`. The file is not touched until the first query.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use the database at its default location.
    #[must_use]
    pub fn at_default_path() -> Self {
        Self::new(Self::default_path())
    }

    /// Default database path: `%PROGRAMDATA%/SteelSeries/GG/apps/sonar/db/database.db`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        program_data_dir().join(SONAR_DB_RELATIVE_PATH)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a read-only connection.
    fn connect(&self) -> DbResult<Connection> {
        if !self.path.exists() {
            return Err(DbError::NotFound(self.path.clone()));
        }
        debug!(path = ?self.path, "Opening Sonar database");
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }
}

/// Windows program data directory, `C:/ProgramData` when unset.
#[must_use]
pub fn program_data_dir() -> PathBuf {
    std::env::var_os("PROGRAMDATA").map_or_else(|| PathBuf::from("C:/ProgramData"), PathBuf::from)
}
