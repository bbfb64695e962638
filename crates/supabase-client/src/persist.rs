//! On-disk persistence of the signed-in session.
//!
//! The session is kept as a single JSON file so that consecutive CLI
//! invocations stay signed in.

use anyhow::{Context, Result};
use shared::Session;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Session file manager
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session, if one exists
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No stored session");
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file: {}", self.path.display()))?;

        let session: Session = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse session file: {}", self.path.display()))?;

        debug!(path = %self.path.display(), user_id = %session.user.id, "Stored session loaded");
        Ok(Some(session))
    }

    /// Store `session`, replacing any previous one
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create session directory: {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(session)
            .context("Failed to serialize session")?;

        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write session file: {}", self.path.display()))?;

        info!(path = %self.path.display(), "Session stored");
        Ok(())
    }

    /// Remove the stored session
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove session file: {}", self.path.display()))?;
            info!(path = %self.path.display(), "Stored session cleared");
        }
        Ok(())
    }
}
