//! Durable session storage.
//!
//! Two stores live outside the process:
//! - a key/value store holding the "previously logged in" marker
//! - a cookie jar holding the refresh credential with an expiry
//!
//! `FileStorage` keeps both in `<base>/session.json` with restricted
//! permissions (0600). Stored values are never logged in full.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::paths;

/// Marker key: `"true"` after a successful login.
pub const LOGGED_KEY: &str = "jobseek_logged";
/// Cookie name of the refresh credential.
pub const REFRESH_COOKIE: &str = "jobseek_rfToken";
/// Lifetime of the refresh credential cookie.
pub const REFRESH_COOKIE_DAYS: i64 = 30;

/// Session storage filename.
const SESSION_FILE: &str = "session.json";

/// Expiry for a refresh credential written at `now`.
pub fn refresh_cookie_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(REFRESH_COOKIE_DAYS)
}

/// Local-storage-like string store.
pub trait KeyValueStore: Send + Sync {
    /// # Errors
    /// Returns an error if the backing store cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// # Errors
    /// Returns an error if the backing store cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// # Errors
    /// Returns an error if the backing store cannot be written.
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Cookie-like store with per-entry expiry.
pub trait CookieJar: Send + Sync {
    /// # Errors
    /// Returns an error if the backing store cannot be written.
    fn set_cookie(&self, name: &str, value: &str, expires_at: DateTime<Utc>) -> Result<()>;

    /// Returns the cookie unless it is missing or expired.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be read.
    fn cookie(&self, name: &str) -> Result<Option<StoredCookie>>;

    /// # Errors
    /// Returns an error if the backing store cannot be written.
    fn remove_cookie(&self, name: &str) -> Result<()>;
}

/// A cookie value with its expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub value: String,
    /// Expiry timestamp in milliseconds since epoch
    pub expires: i64,
}

impl StoredCookie {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires: expires_at.timestamp_millis(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() >= self.expires
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.expires)
    }
}

/// On-disk layout of the session file.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub local: BTreeMap<String, String>,
    #[serde(default)]
    pub cookies: BTreeMap<String, StoredCookie>,
}

impl SessionData {
    fn live_cookie(&self, name: &str) -> Option<StoredCookie> {
        self.cookies
            .get(name)
            .filter(|cookie| !cookie.is_expired())
            .cloned()
    }
}

/// File-backed storage for both the marker and the refresh cookie.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Storage at the default location under `JOBSEEK_HOME`.
    pub fn default_location() -> Self {
        Self::new(Self::default_path())
    }

    pub fn default_path() -> PathBuf {
        paths::jobseek_home().join(SESSION_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the session file. Returns empty data if it doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<SessionData> {
        let Some(contents) = self.read()? else {
            return Ok(SessionData::default());
        };

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session from {}", self.path.display()))
    }

    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        fs::read_to_string(&self.path)
            .map(Some)
            .with_context(|| format!("Failed to read session from {}", self.path.display()))
    }

    /// Saves the session file with restricted permissions (0600).
    ///
    /// Writes a temp file next to it and renames it into place, so a crash
    /// never leaves a half-written session file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(&self, data: &SessionData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(data).context("Failed to serialize session data")?;
        let tmp_path = self.path.with_extension("json.tmp");

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&tmp_path)
                .with_context(|| format!("Failed to open {} for writing", tmp_path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", tmp_path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&tmp_path, contents)
                .with_context(|| format!("Failed to write to {}", tmp_path.display()))?;
        }

        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                self.path.display()
            )
        })
    }

    /// Read-modify-write. An unparseable file is replaced rather than
    /// blocking every later write.
    fn update(&self, f: impl FnOnce(&mut SessionData)) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut data = match self.read()? {
            None => SessionData::default(),
            Some(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "session file is corrupt, starting from empty"
                );
                SessionData::default()
            }),
        };
        f(&mut data);
        self.save(&data)
    }
}

impl KeyValueStore for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.local.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.update(|data| {
            data.local.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.update(|data| {
            data.local.remove(key);
        })
    }
}

impl CookieJar for FileStorage {
    fn set_cookie(&self, name: &str, value: &str, expires_at: DateTime<Utc>) -> Result<()> {
        self.update(|data| {
            data.cookies
                .insert(name.to_string(), StoredCookie::new(value, expires_at));
        })
    }

    fn cookie(&self, name: &str) -> Result<Option<StoredCookie>> {
        Ok(self.load()?.live_cookie(name))
    }

    fn remove_cookie(&self, name: &str) -> Result<()> {
        self.update(|data| {
            data.cookies.remove(name);
        })
    }
}

/// In-memory storage (tests, embedding in a long-lived process).
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: Mutex<SessionData>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything stored, expired cookies included.
    pub fn snapshot(&self) -> SessionData {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn with<T>(&self, f: impl FnOnce(&mut SessionData) -> T) -> T {
        let mut data = self.data.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut data)
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.with(|data| data.local.get(key).cloned()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.with(|data| data.local.insert(key.to_string(), value.to_string()));
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.with(|data| data.local.remove(key));
        Ok(())
    }
}

impl CookieJar for MemoryStorage {
    fn set_cookie(&self, name: &str, value: &str, expires_at: DateTime<Utc>) -> Result<()> {
        self.with(|data| {
            data.cookies
                .insert(name.to_string(), StoredCookie::new(value, expires_at))
        });
        Ok(())
    }

    fn cookie(&self, name: &str) -> Result<Option<StoredCookie>> {
        Ok(self.with(|data| data.live_cookie(name)))
    }

    fn remove_cookie(&self, name: &str) -> Result<()> {
        self.with(|data| data.cookies.remove(name));
        Ok(())
    }
}
