//! On-disk state: the staging area and the login session
//!
//! Both live as JSON files in the state directory so that staged commits
//! survive between invocations.

use crate::auth::Session;
use crate::error::Result;
use crate::store::CommitStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const STAGED_FILE: &str = "staged.json";
const SESSION_FILE: &str = "session.json";

/// State directory handle
#[derive(Debug, Clone)]
pub struct StateDir {
    root: PathBuf,
}

impl StateDir {
    /// Open (and create if needed) a state directory
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory path
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Load the staging area (empty if nothing was staged)
    pub fn load_store(&self) -> Result<CommitStore> {
        Ok(self.read_json(STAGED_FILE)?.unwrap_or_default())
    }

    /// Save the staging area
    pub fn save_store(&self, store: &CommitStore) -> Result<()> {
        if store.is_empty() {
            return self.remove(STAGED_FILE);
        }
        self.write_json(STAGED_FILE, store)
    }

    /// Load the stored session
    pub fn load_session(&self) -> Result<Option<Session>> {
        self.read_json(SESSION_FILE)
    }

    /// Save the session
    pub fn save_session(&self, session: &Session) -> Result<()> {
        self.write_json(SESSION_FILE, session)
    }

    /// Forget the session
    pub fn clear_session(&self) -> Result<()> {
        self.remove(SESSION_FILE)
    }

    fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.root.join(name);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes to a temp file, then renames over the target
    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.root.join(name);
        let tmp = self.root.join(format!("{name}.tmp"));
        fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
        fs::rename(&tmp, &path)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.root.join(name)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
