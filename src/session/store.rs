//! Credential persistence over a pluggable key/value medium.
//!
//! The store owns three fixed keys: the bearer token, the cached profile and
//! the auth timestamp. Reads and writes never fail from the caller's point of
//! view: a missing or broken backend degrades to "absent", because callers
//! run these unconditionally on every navigation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const TOKEN_KEY: &str = "admin.token";
pub const PROFILE_KEY: &str = "admin.profile";
pub const AUTH_AT_KEY: &str = "admin.auth_at";

/// Display-oriented user record cached locally. Distinct from token claims:
/// the authority may enrich it (updated display name, avatar) after login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Durable key/value medium. Implementations must not panic or return errors:
/// an unavailable backend reads as empty and swallows writes.
pub trait Medium: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Process-local medium for tests and hosts without durable storage.
#[derive(Default)]
pub struct MemoryMedium {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryMedium {
    pub fn new() -> Self { Self::default() }
}

impl Medium for MemoryMedium {
    fn get(&self, key: &str) -> Option<String> {
        self.map.read().get(key).cloned()
    }
    fn set(&self, key: &str, value: &str) {
        self.map.write().insert(key.to_string(), value.to_string());
    }
    fn remove(&self, key: &str) {
        self.map.write().remove(key);
    }
}

/// File-backed medium: one JSON object of string keys, loaded once and
/// written through on every mutation. Unreadable or unwritable files degrade
/// to the in-memory view rather than surfacing an error.
pub struct FileMedium {
    path: PathBuf,
    cache: RwLock<HashMap<String, String>>,
}

impl FileMedium {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let cache = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str::<HashMap<String, String>>(&raw).unwrap_or_else(|e| {
                debug!("store.file parse failed path={:?} err={}", path, e);
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Self { path, cache: RwLock::new(cache) }
    }

    fn persist(&self) {
        let snapshot = self.cache.read().clone();
        let raw = match serde_json::to_string(&snapshot) {
            Ok(s) => s,
            Err(e) => {
                debug!("store.file serialize failed err={}", e);
                return;
            }
        };
        if let Some(dir) = self.path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        if let Err(e) = std::fs::write(&self.path, raw) {
            debug!("store.file write failed path={:?} err={}", self.path, e);
        }
    }
}

impl Medium for FileMedium {
    fn get(&self, key: &str) -> Option<String> {
        self.cache.read().get(key).cloned()
    }
    fn set(&self, key: &str, value: &str) {
        self.cache.write().insert(key.to_string(), value.to_string());
        self.persist();
    }
    fn remove(&self, key: &str) {
        self.cache.write().remove(key);
        self.persist();
    }
}

/// Owner of the persisted session triple. Cheap to clone; all clones share
/// the same medium.
#[derive(Clone)]
pub struct CredentialStore {
    medium: Arc<dyn Medium>,
}

impl CredentialStore {
    pub fn new(medium: Arc<dyn Medium>) -> Self { Self { medium } }

    pub fn in_memory() -> Self { Self::new(Arc::new(MemoryMedium::new())) }

    pub fn token(&self) -> Option<String> {
        self.medium.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn set_token(&self, token: &str) {
        self.medium.set(TOKEN_KEY, token);
    }

    pub fn profile(&self) -> Option<CachedProfile> {
        let raw = self.medium.get(PROFILE_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(p) => Some(p),
            Err(e) => {
                debug!("store.profile corrupt, treating as absent err={}", e);
                None
            }
        }
    }

    pub fn set_profile(&self, profile: &CachedProfile) {
        match serde_json::to_string(profile) {
            Ok(raw) => self.medium.set(PROFILE_KEY, &raw),
            Err(e) => debug!("store.profile serialize failed err={}", e),
        }
    }

    /// Epoch millis of the last login or successful verification.
    pub fn auth_timestamp(&self) -> Option<i64> {
        self.medium.get(AUTH_AT_KEY).and_then(|v| v.parse::<i64>().ok())
    }

    pub fn touch_auth_timestamp(&self) {
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.medium.set(AUTH_AT_KEY, &now_ms.to_string());
    }

    /// Login-boundary helper: persist the full session triple in one call.
    /// The login form calls this after the authority issues a credential.
    pub fn install(&self, token: &str, profile: &CachedProfile) {
        self.set_token(token);
        self.set_profile(profile);
        self.touch_auth_timestamp();
    }

    pub fn clear(&self) {
        self.medium.remove(TOKEN_KEY);
        self.medium.remove(PROFILE_KEY);
        self.medium.remove(AUTH_AT_KEY);
    }
}
