//! The remembered username and last room, kept next to the config file.
//!
//! Stored as `identity.toml`.  The file is advisory: a missing or unreadable
//! file means "no stored identity", and a failed write is logged and ignored.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::application::ports::{IdentityRepository, StoredIdentity};
use crate::infrastructure::storage::config::{config_dir, write_toml, ConfigError};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
struct IdentityFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    room_name: Option<String>,
}

/// File-backed [`IdentityRepository`].
pub struct IdentityStore {
    path: PathBuf,
    // Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl IdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    /// Store in the platform config directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoPlatformConfigDir`] if there is none.
    pub fn in_config_dir() -> Result<Self, ConfigError> {
        Ok(Self::new(config_dir()?.join("identity.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> IdentityFile {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return IdentityFile::default(),
            Err(e) => {
                warn!("could not read {}: {e}", self.path.display());
                return IdentityFile::default();
            }
        };
        toml::from_str(&content).unwrap_or_else(|e| {
            warn!("ignoring malformed {}: {e}", self.path.display());
            IdentityFile::default()
        })
    }

    fn update(&self, f: impl FnOnce(&mut IdentityFile)) {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = self.read();
        f(&mut file);
        if let Err(e) = write_toml(&file, &self.path) {
            warn!("could not save identity: {e}");
        }
    }
}

impl IdentityRepository for IdentityStore {
    fn load(&self) -> StoredIdentity {
        let file = self.read();
        StoredIdentity {
            username: file.username.filter(|s| !s.is_empty()),
            room_name: file.room_name.filter(|s| !s.is_empty()),
        }
    }

    fn save_username(&self, username: &str) {
        self.update(|file| file.username = Some(username.to_string()));
    }

    fn save_room_name(&self, room_name: &str) {
        self.update(|file| file.room_name = Some(room_name.to_string()));
    }
}
