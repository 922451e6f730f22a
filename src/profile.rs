// src/profile.rs
//! Profile store: the user's keyword list behind an explicit persistence
//! boundary.
//!
//! The store is an owned value. It reads the persisted record once in
//! [`ProfileStore::open`] and writes it back synchronously after every
//! mutation. Write failures are logged and swallowed; the in-memory profile
//! keeps the change for the rest of the session.

use anyhow::{Context, Result};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::watch;

use crate::telemetry::ensure_metrics_described;

/// Storage key of the keyword list.
pub const PROFILE_KEY: &str = "profile_keywords";

pub const DEFAULT_KEYWORDS: [&str; 4] = [
    "information design",
    "health communication",
    "AI chatbot",
    "patient engagement",
];

/// Durable string key-value storage scoped to one user/device.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/* ----------------------------
Backends
---------------------------- */

/// All keys in a single JSON object file. Writes replace the file via a
/// sibling temp file + rename.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", self.path.display()))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut all = self.read_all().unwrap_or_else(|e| {
            tracing::warn!(target: "profile", error = ?e, "store file unreadable; rewriting");
            BTreeMap::new()
        });
        all.insert(key.to_string(), value.to_string());

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(&all).context("serializing store")?;
        fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

/// Process-local storage for hosts without a writable disk, and for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/* ----------------------------
Profile
---------------------------- */

/// Ordered keyword list. Duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile {
    keywords: Vec<String>,
}

impl Profile {
    pub fn new(keywords: Vec<String>) -> Self {
        Self { keywords }
    }

    pub fn default_seed() -> Self {
        Self::new(DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect())
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Profile {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/* ----------------------------
Store
---------------------------- */

pub struct ProfileStore<S: KeyValueStore> {
    store: S,
    current: Profile,
    tx: watch::Sender<Profile>,
}

impl<S: KeyValueStore> ProfileStore<S> {
    /// Read the persisted profile. A missing or unreadable record is replaced
    /// by the default seed, which is written back immediately.
    pub fn open(store: S) -> Self {
        ensure_metrics_described();

        let persisted = match store.get(PROFILE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Profile>(&raw) {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::warn!(target: "profile", error = %e, "persisted profile is malformed; using default seed");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(target: "profile", error = ?e, "profile read failed; using default seed");
                None
            }
        };

        let seeded = persisted.is_none();
        let current = persisted.unwrap_or_else(Profile::default_seed);
        let (tx, _rx) = watch::channel(current.clone());
        let this = Self { store, current, tx };
        if seeded {
            this.persist();
        }
        tracing::debug!(target: "profile", keywords = this.current.len(), seeded, "profile opened");
        this
    }

    pub fn get(&self) -> Profile {
        self.current.clone()
    }

    /// Append the trimmed keyword. Blank input is a no-op.
    pub fn add(&mut self, keyword: &str) -> Profile {
        let kw = keyword.trim();
        if kw.is_empty() {
            return self.get();
        }
        let mut next = self.current.clone();
        next.keywords.push(kw.to_string());
        self.commit(next)
    }

    /// Remove the keyword at `index`. Out of range is a no-op.
    pub fn remove(&mut self, index: usize) -> Profile {
        if index >= self.current.len() {
            return self.get();
        }
        let mut next = self.current.clone();
        next.keywords.remove(index);
        self.commit(next)
    }

    /// Receiver that observes every applied mutation.
    pub fn subscribe(&self) -> watch::Receiver<Profile> {
        self.tx.subscribe()
    }

    fn commit(&mut self, next: Profile) -> Profile {
        self.current = next;
        self.persist();
        self.tx.send_replace(self.current.clone());
        self.get()
    }

    fn persist(&self) {
        let res = serde_json::to_string(&self.current)
            .context("serializing profile")
            .and_then(|raw| self.store.set(PROFILE_KEY, &raw));
        if let Err(e) = res {
            counter!("profile_persist_errors_total").increment(1);
            tracing::warn!(target: "profile", error = ?e, "profile persist failed; keeping change in memory");
        }
    }
}
