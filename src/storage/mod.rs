//! Local profile persistence
//!
//! Small sqlite database holding the per-installation state: the widget's
//! session attachment and the console's selected agent identity. The
//! backend remains the source of truth for everything conversational;
//! these rows only let each front end reattach after a restart.

use crate::error::{DeskwireError, Result};
use crate::session::AgentDescriptor;
use anyhow::Context;
use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;

pub mod types;
pub use types::WidgetProfile;

/// Storage backend for local profiles
pub struct ProfileStore {
    db_path: PathBuf,
}

impl ProfileStore {
    /// Create a new storage instance
    ///
    /// Initializes the database file in the user's data directory. The
    /// `DESKWIRE_PROFILE_DB` environment variable overrides the location,
    /// which keeps tests and scratch setups away from the real profile.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("DESKWIRE_PROFILE_DB") {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("io", "deskwire", "deskwire")
            .ok_or_else(|| DeskwireError::Storage("Could not determine data directory".into()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| DeskwireError::Storage(e.to_string()))?;

        let db_path = data_dir.join("profile.db");
        let storage = Self { db_path };
        storage.init()?;

        Ok(storage)
    }

    /// Create a storage instance at an explicit database path
    ///
    /// # Examples
    ///
    /// ```
    /// use deskwire::storage::ProfileStore;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = ProfileStore::new_with_path(dir.path().join("profile.db")).unwrap();
    /// assert!(store.load_widget_profile().unwrap().is_none());
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for database")
                .map_err(|e| DeskwireError::Storage(e.to_string()))?;
        }

        let storage = Self { db_path };
        storage.init()?;
        Ok(storage)
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| DeskwireError::Storage(e.to_string()).into())
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS widget_profile (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                session_id TEXT NOT NULL,
                email TEXT NOT NULL,
                name TEXT,
                last_read TEXT,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS console_identity (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .context("Failed to create tables")
        .map_err(|e| DeskwireError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Save or replace the widget profile
    pub fn save_widget_profile(&self, profile: &WidgetProfile) -> Result<()> {
        let conn = self.open()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO widget_profile (id, session_id, email, name, last_read, updated_at)
             VALUES (1, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                session_id = excluded.session_id,
                email = excluded.email,
                name = excluded.name,
                last_read = excluded.last_read,
                updated_at = excluded.updated_at",
            params![
                profile.session_id,
                profile.email,
                profile.name,
                profile.last_read,
                now
            ],
        )
        .context("Failed to save widget profile")
        .map_err(|e| DeskwireError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Load the widget profile, if one has been saved
    pub fn load_widget_profile(&self) -> Result<Option<WidgetProfile>> {
        let conn = self.open()?;

        conn.query_row(
            "SELECT session_id, email, name, last_read FROM widget_profile WHERE id = 1",
            [],
            |row| {
                Ok(WidgetProfile {
                    session_id: row.get(0)?,
                    email: row.get(1)?,
                    name: row.get(2)?,
                    last_read: row.get(3)?,
                })
            },
        )
        .optional()
        .context("Failed to load widget profile")
        .map_err(|e| DeskwireError::Storage(e.to_string()).into())
    }

    /// Remove the widget profile
    ///
    /// Used by the hard reset when the session no longer exists.
    pub fn clear_widget_profile(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute("DELETE FROM widget_profile WHERE id = 1", [])
            .context("Failed to clear widget profile")
            .map_err(|e| DeskwireError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Update only the last-read marker on the stored profile
    ///
    /// No-op when no profile exists.
    pub fn update_last_read(&self, last_read: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "UPDATE widget_profile SET last_read = ?, updated_at = ? WHERE id = 1",
            params![last_read, Utc::now().to_rfc3339()],
        )
        .context("Failed to update last read marker")
        .map_err(|e| DeskwireError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Save or replace the console's selected agent identity
    pub fn save_agent_identity(&self, identity: &AgentDescriptor) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "INSERT INTO console_identity (id, name, email, updated_at)
             VALUES (1, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                updated_at = excluded.updated_at",
            params![identity.name, identity.email, Utc::now().to_rfc3339()],
        )
        .context("Failed to save agent identity")
        .map_err(|e| DeskwireError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Load the console's selected agent identity, if any
    pub fn load_agent_identity(&self) -> Result<Option<AgentDescriptor>> {
        let conn = self.open()?;

        conn.query_row(
            "SELECT name, email FROM console_identity WHERE id = 1",
            [],
            |row| {
                Ok(AgentDescriptor {
                    name: row.get(0)?,
                    email: row.get(1)?,
                })
            },
        )
        .optional()
        .context("Failed to load agent identity")
        .map_err(|e| DeskwireError::Storage(e.to_string()).into())
    }
}
