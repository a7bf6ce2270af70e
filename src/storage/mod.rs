//! Local client state
//!
//! The only persisted client state is a "logged in" flag, stored as a small
//! JSON file in the user's data directory. There is no authentication flow;
//! the flag is set and cleared by the `login` and `logout` commands and read
//! once at session startup.

use crate::error::{MdChatError, Result};
use anyhow::Context;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub mod types;
pub use types::AuthRecord;

const AUTH_FILE_NAME: &str = "auth.json";

/// File-backed logged-in flag
#[derive(Debug, Clone)]
pub struct AuthStore {
    path: PathBuf,
}

impl AuthStore {
    /// Open the store at `override_path`, or in the user's data directory
    /// when no override is given
    ///
    /// # Errors
    ///
    /// Returns [`MdChatError::Storage`] if no data directory can be
    /// determined
    pub fn new(override_path: Option<&str>) -> Result<Self> {
        if let Some(path) = override_path {
            return Ok(Self::new_with_path(path));
        }

        let proj_dirs = ProjectDirs::from("com", "mdagents", "mdchat")
            .ok_or_else(|| MdChatError::Storage("Could not determine data directory".into()))?;

        Ok(Self::new_with_path(proj_dirs.data_dir().join(AUTH_FILE_NAME)))
    }

    /// Use a specific flag file
    ///
    /// # Examples
    ///
    /// ```
    /// use mdchat::storage::AuthStore;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = AuthStore::new_with_path(dir.path().join("auth.json"));
    /// assert!(!store.is_logged_in());
    /// store.set_logged_in(true).unwrap();
    /// assert!(store.is_logged_in());
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Location of the flag file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the flag
    ///
    /// A missing or unreadable file counts as logged out.
    pub fn is_logged_in(&self) -> bool {
        match self.load() {
            Ok(record) => record.map(|r| r.logged_in).unwrap_or(false),
            Err(e) => {
                tracing::warn!("Ignoring unreadable auth file {}: {}", self.path.display(), e);
                false
            }
        }
    }

    /// Read the stored record, if any
    pub fn load(&self) -> Result<Option<AuthRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)
            .context("Failed to read auth file")
            .map_err(|e| MdChatError::Storage(e.to_string()))?;
        let record = serde_json::from_str(&contents)
            .context("Failed to parse auth file")
            .map_err(|e| MdChatError::Storage(e.to_string()))?;
        Ok(Some(record))
    }

    /// Write the flag
    pub fn set_logged_in(&self, logged_in: bool) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create data directory")
                .map_err(|e| MdChatError::Storage(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(&AuthRecord::new(logged_in))
            .context("Failed to serialize auth record")
            .map_err(|e| MdChatError::Storage(e.to_string()))?;
        std::fs::write(&self.path, json)
            .context("Failed to write auth file")
            .map_err(|e| MdChatError::Storage(e.to_string()))?;

        tracing::debug!(path = %self.path.display(), logged_in, "Updated auth flag");
        Ok(())
    }
}
