//! Remote database credentials.
//!
//! Two named slots (URL and token) are resolved on every read: the runtime
//! slot wins, a value baked in at build time is the fallback. Saving takes
//! effect on the next read, so a running dashboard can be pointed at a new
//! database without a restart.

mod backend;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

pub use backend::{CredentialBackend, FileBackend, MemoryBackend};

use crate::platform::{NativePlatform, Platform};

pub const URL_SLOT: &str = "turso_url";
pub const TOKEN_SLOT: &str = "turso_token";
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Schemes rewritten to `https://` when a URL is saved.
const REWRITTEN_SCHEMES: &[&str] = &["libsql://", "wss://"];

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("credential file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub url: String,
    pub token: String,
}

impl Credentials {
    /// Token with everything but the last four characters hidden.
    pub fn masked_token(&self) -> String {
        let count = self.token.chars().count();
        if count <= 4 {
            return "****".to_string();
        }
        let tail: String = self.token.chars().skip(count - 4).collect();
        format!("****{}", tail)
    }
}

/// Build-time fallback values.
#[derive(Debug, Clone, Default)]
pub struct CredentialDefaults {
    pub url: Option<String>,
    pub token: Option<String>,
}

impl CredentialDefaults {
    pub fn from_build_env() -> Self {
        Self {
            url: option_env!("MISSION_CONTROL_TURSO_URL").map(str::to_string),
            token: option_env!("MISSION_CONTROL_TURSO_AUTH_TOKEN").map(str::to_string),
        }
    }
}

/// Where the effective URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Runtime,
    BuildTime,
    Missing,
}

/// Rewrites a recognized alternate scheme to `https://` and drops trailing slashes.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let rewritten = REWRITTEN_SCHEMES
        .iter()
        .find_map(|scheme| {
            trimmed
                .strip_prefix(scheme)
                .map(|rest| format!("https://{}", rest))
        })
        .unwrap_or_else(|| trimmed.to_string());
    rewritten.trim_end_matches('/').to_string()
}

/// Checks that a normalized URL is an absolute `http(s)` URL with a host.
pub fn validate_url(url: &str) -> Result<(), String> {
    let parsed = url::Url::parse(url).map_err(|e| format!("invalid database URL '{}': {}", url, e))?;
    if !matches!(parsed.scheme(), "https" | "http") {
        return Err(format!(
            "unsupported scheme '{}'; expected libsql://, https:// or http://",
            parsed.scheme()
        ));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(format!("database URL '{}' has no host", url));
    }
    Ok(())
}

pub struct CredentialStore {
    backend: Box<dyn CredentialBackend>,
    defaults: CredentialDefaults,
}

impl CredentialStore {
    pub fn new(backend: Box<dyn CredentialBackend>, defaults: CredentialDefaults) -> Self {
        Self { backend, defaults }
    }

    /// File-backed store in the platform data directory with build-time defaults.
    pub fn open_default() -> Self {
        let path = NativePlatform::data_dir().join(CREDENTIALS_FILE);
        Self::new(
            Box::new(FileBackend::new(path)),
            CredentialDefaults::from_build_env(),
        )
    }

    pub fn in_memory(defaults: CredentialDefaults) -> Self {
        Self::new(Box::<MemoryBackend>::default(), defaults)
    }

    fn runtime_slot(&self, slot: &str) -> Option<String> {
        match self.backend.get(slot) {
            Ok(value) => value.filter(|v| !v.trim().is_empty()),
            Err(e) => {
                warn!("Ignoring unreadable credential slot '{}': {}", slot, e);
                None
            }
        }
    }

    fn resolve(&self, slot: &str, fallback: Option<&String>) -> Option<String> {
        self.runtime_slot(slot).or_else(|| {
            fallback
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.to_string())
        })
    }

    pub fn get(&self) -> Option<Credentials> {
        let url = self.resolve(URL_SLOT, self.defaults.url.as_ref())?;
        let token = self.resolve(TOKEN_SLOT, self.defaults.token.as_ref())?;
        Some(Credentials { url, token })
    }

    pub fn is_configured(&self) -> bool {
        self.get().is_some()
    }

    pub fn source(&self) -> CredentialSource {
        if self.runtime_slot(URL_SLOT).is_some() {
            CredentialSource::Runtime
        } else if self
            .defaults
            .url
            .as_ref()
            .is_some_and(|v| !v.trim().is_empty())
        {
            CredentialSource::BuildTime
        } else {
            CredentialSource::Missing
        }
    }

    pub fn save(&self, url: &str, token: &str) -> Result<Credentials, CredentialError> {
        let credentials = Credentials {
            url: normalize_url(url),
            token: token.trim().to_string(),
        };
        self.backend.set(URL_SLOT, &credentials.url)?;
        self.backend.set(TOKEN_SLOT, &credentials.token)?;
        info!("Saved credentials for {}", credentials.url);
        Ok(credentials)
    }

    pub fn clear(&self) -> Result<(), CredentialError> {
        self.backend.remove(URL_SLOT)?;
        self.backend.remove(TOKEN_SLOT)?;
        info!("Cleared runtime credentials");
        Ok(())
    }
}
