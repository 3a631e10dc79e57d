//! Connection manager for the database load/unload lifecycle.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::DatabaseConfig;
use crate::db::DatabaseClient;
use crate::error::{QuestionnaireError, Result};

/// An open database with the path it was loaded from.
pub struct ActiveConnection {
    /// Path the database was loaded from.
    pub path: PathBuf,
    /// Database client.
    pub db: Box<dyn DatabaseClient>,
}

/// Observable state of the connection manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unloaded,
    Loaded,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unloaded => write!(f, "Unloaded"),
            Self::Loaded => write!(f, "Loaded"),
        }
    }
}

/// Owns the single database connection.
///
/// Transitions: Unloaded -> Loaded on a successful [`load`](Self::load),
/// Loaded -> Unloaded on [`unload`](Self::unload). Loading while loaded is
/// refused; failed loads leave the state untouched.
#[derive(Default)]
pub struct ConnectionManager {
    active: Option<ActiveConnection>,
}

impl ConnectionManager {
    /// Creates a manager with no database loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager around an already-open client.
    pub fn with_connection(db: Box<dyn DatabaseClient>, path: impl Into<PathBuf>) -> Self {
        Self {
            active: Some(ActiveConnection {
                path: path.into(),
                db,
            }),
        }
    }

    /// Loads the database named by the configuration.
    pub async fn load(&mut self, config: &DatabaseConfig) -> Result<()> {
        if self.active.is_some() {
            return Err(QuestionnaireError::connection(
                "A database is already loaded. Unload it before loading another.",
            ));
        }

        let path = config
            .path
            .as_deref()
            .ok_or_else(|| QuestionnaireError::connection("No database path given."))?;

        if !path.exists() {
            return Err(QuestionnaireError::connection("Database file not found."));
        }

        let db = crate::db::connect(config).await?;
        info!("Database loaded from {}", path.display());

        self.active = Some(ActiveConnection {
            path: path.to_path_buf(),
            db,
        });

        Ok(())
    }

    /// Closes the active database. Returns false if nothing was loaded.
    pub async fn unload(&mut self) -> Result<bool> {
        match self.active.take() {
            Some(conn) => {
                conn.db.close().await?;
                info!("Database unloaded from {}", conn.path.display());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> ConnectionState {
        if self.active.is_some() {
            ConnectionState::Loaded
        } else {
            ConnectionState::Unloaded
        }
    }

    /// Check if a database is loaded.
    pub fn is_loaded(&self) -> bool {
        self.active.is_some()
    }

    /// Get the active database client.
    pub fn db(&self) -> Option<&dyn DatabaseClient> {
        self.active.as_ref().map(|c| c.db.as_ref())
    }

    /// Get the active database client, or the error shown when none is loaded.
    pub fn require_db(&self) -> Result<&dyn DatabaseClient> {
        self.db()
            .ok_or_else(|| QuestionnaireError::connection("Please load a database first."))
    }

    /// Get the path of the loaded database.
    pub fn path(&self) -> Option<&Path> {
        self.active.as_ref().map(|c| c.path.as_path())
    }
}
