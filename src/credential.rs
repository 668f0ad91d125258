// The API key: loaded once at startup, replaced only by a validated save.
// Visual: with no key on hand the key dialog is the first thing you see.

use std::cell::RefCell;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Error;

pub const CREDENTIAL_FILE_NAME: &str = "credential.json";
const APP_DIR_NAME: &str = "co-drawing";

/// One durable slot holding the API key.
pub trait CredentialBackend {
    fn read(&self) -> Result<Option<String>, Error>;
    fn write(&self, value: &str) -> Result<(), Error>;
}

#[derive(Serialize, Deserialize)]
struct CredentialFile {
    api_key: String,
}

/// JSON file on disk, by default under the platform config directory.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs_next::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CREDENTIAL_FILE_NAME))
    }
}

impl CredentialBackend for FileBackend {
    fn read(&self) -> Result<Option<String>, Error> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| Error::Storage(format!("read {}: {e}", self.path.display())))?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        let file: CredentialFile = serde_json::from_str(&content)
            .map_err(|e| Error::Storage(format!("parse {}: {e}", self.path.display())))?;
        Ok(Some(file.api_key))
    }

    fn write(&self, value: &str) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("create {}: {e}", parent.display())))?;
        }
        let json = serde_json::to_string_pretty(&CredentialFile { api_key: value.to_string() })
            .map_err(|e| Error::Storage(format!("serialize credential: {e}")))?;
        std::fs::write(&self.path, json)
            .map_err(|e| Error::Storage(format!("write {}: {e}", self.path.display())))
    }
}

/// Slot that lives only as long as the process.
#[derive(Default)]
pub struct MemoryBackend {
    slot: RefCell<Option<String>>,
}

impl CredentialBackend for MemoryBackend {
    fn read(&self) -> Result<Option<String>, Error> {
        Ok(self.slot.borrow().clone())
    }

    fn write(&self, value: &str) -> Result<(), Error> {
        *self.slot.borrow_mut() = Some(value.to_string());
        Ok(())
    }
}

/// Holds the API key for the session and keeps the backend in sync.
pub struct CredentialStore {
    backend: Box<dyn CredentialBackend>,
    value: Option<String>,
    error: Option<String>,
}

impl CredentialStore {
    pub fn new(backend: Box<dyn CredentialBackend>) -> Self {
        Self { backend, value: None, error: None }
    }

    /// Read the persisted key. Blank stored values count as absent.
    /// Returns whether a credential is now available.
    pub fn load(&mut self) -> Result<bool, Error> {
        self.value = self.backend.read()?.filter(|v| !v.trim().is_empty());
        debug!(present = self.value.is_some(), "loaded credential");
        Ok(self.value.is_some())
    }

    /// Use a key for this session only (e.g. from the environment).
    pub fn seed(&mut self, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        info!("using API key from the environment for this session");
        self.value = Some(value.to_string());
    }

    /// Validate and persist a new key. On failure the previous key stays.
    pub fn save(&mut self, candidate: &str) -> Result<(), Error> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            let msg = "Please enter an API key.".to_string();
            self.error = Some(msg.clone());
            return Err(Error::Validation(msg));
        }
        if let Err(err) = self.backend.write(candidate) {
            warn!(error = %err, "could not persist credential");
            self.error = Some(err.to_string());
            return Err(err);
        }
        self.value = Some(candidate.to_string());
        self.error = None;
        info!("credential saved");
        Ok(())
    }

    pub fn get(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Inline message from the last rejected save, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}
