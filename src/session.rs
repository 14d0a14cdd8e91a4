//! Persistence for the logged-in user between runs.

use crate::config::Config;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Stores the serialized identity of the current user.
pub trait SessionStore: Send + Sync {
  fn save(&self, identity: &[u8]) -> Result<()>;

  /// Returns an empty buffer when nothing is stored.
  fn load(&self) -> Result<Vec<u8>>;

  fn clear(&self) -> Result<()>;
}

/// Keeps the session in `<data_dir>/skynology_session_<application_id>`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
  path: PathBuf,
}

impl FileSessionStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn for_config(config: &Config) -> Self {
    Self::new(
      config
        .data_dir
        .join(format!("skynology_session_{}", config.application_id)),
    )
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl SessionStore for FileSessionStore {
  fn save(&self, identity: &[u8]) -> Result<()> {
    fs::write(&self.path, identity)?;
    Ok(())
  }

  fn load(&self) -> Result<Vec<u8>> {
    match fs::read(&self.path) {
      Ok(bytes) => Ok(bytes),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
      Err(e) => Err(e.into()),
    }
  }

  fn clear(&self) -> Result<()> {
    fs::write(&self.path, b"")?;
    Ok(())
  }
}

/// In-process session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
  identity: Mutex<Vec<u8>>,
}

impl MemorySessionStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl SessionStore for MemorySessionStore {
  fn save(&self, identity: &[u8]) -> Result<()> {
    let mut guard = self
      .identity
      .lock()
      .map_err(|_| Error::Session("session lock poisoned".to_string()))?;
    *guard = identity.to_vec();
    Ok(())
  }

  fn load(&self) -> Result<Vec<u8>> {
    self
      .identity
      .lock()
      .map(|guard| guard.clone())
      .map_err(|_| Error::Session("session lock poisoned".to_string()))
  }

  fn clear(&self) -> Result<()> {
    self.save(&[])
  }
}
