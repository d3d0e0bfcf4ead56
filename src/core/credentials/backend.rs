use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::CredentialError;
use crate::platform::{NativePlatform, Platform};

/// Named-slot persistence behind the credential store.
pub trait CredentialBackend: Send + Sync {
    fn get(&self, slot: &str) -> Result<Option<String>, CredentialError>;
    fn set(&self, slot: &str, value: &str) -> Result<(), CredentialError>;
    fn remove(&self, slot: &str) -> Result<(), CredentialError>;
}

/// JSON object on disk, re-read on every access so edits from another
/// process are picked up without a restart.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, CredentialError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, slots: &BTreeMap<String, String>) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
            NativePlatform::restrict_dir_permissions(parent);
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(slots)?)?;
        NativePlatform::restrict_file_permissions(&self.path);
        Ok(())
    }
}

impl CredentialBackend for FileBackend {
    fn get(&self, slot: &str) -> Result<Option<String>, CredentialError> {
        Ok(self.load()?.remove(slot))
    }

    fn set(&self, slot: &str, value: &str) -> Result<(), CredentialError> {
        let mut slots = self.load()?;
        slots.insert(slot.to_string(), value.to_string());
        self.store(&slots)
    }

    fn remove(&self, slot: &str) -> Result<(), CredentialError> {
        let mut slots = self.load()?;
        if slots.remove(slot).is_some() {
            self.store(&slots)?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    slots: Mutex<BTreeMap<String, String>>,
}

impl CredentialBackend for MemoryBackend {
    fn get(&self, slot: &str) -> Result<Option<String>, CredentialError> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        Ok(slots.get(slot).cloned())
    }

    fn set(&self, slot: &str, value: &str) -> Result<(), CredentialError> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.insert(slot.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<(), CredentialError> {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.remove(slot);
        Ok(())
    }
}
