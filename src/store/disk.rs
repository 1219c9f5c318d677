// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Disk-based store with file locking and versioning

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use alloy_primitives::BlockNumber;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{CacheStore, StoreStats};
use crate::cache::KeyState;
use crate::config::constants::STORE_FORMAT_VERSION;
use crate::errors::StoreError;
use crate::key::CacheKey;
use crate::types::{BlockInterval, CachedEvent};

/// Serialized store format (versioned)
#[derive(Debug, Serialize, Deserialize)]
struct StoreData {
    /// Store format version
    version: u32,
    /// State of every cache key
    keys: BTreeMap<CacheKey, KeyState>,
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            version: STORE_FORMAT_VERSION,
            keys: BTreeMap::new(),
        }
    }
}

/// Paths used by one store
#[derive(Debug, Clone)]
struct StorePaths {
    data: PathBuf,
    temp: PathBuf,
    lock: PathBuf,
}

impl StorePaths {
    fn new(data: PathBuf) -> Self {
        Self {
            temp: sibling(&data, "tmp"),
            lock: sibling(&data, "lock"),
            data,
        }
    }
}

/// `events.json` -> `events.json.{suffix}`, whatever extension the data file has
fn sibling(data: &Path, suffix: &str) -> PathBuf {
    let mut name = data.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Disk-based store keeping all keys in one versioned JSON file
///
/// - Every `commit_save` and `clear_prefix` reads the file, applies the change
///   in memory and writes the result to a temp file that is atomically renamed
///   over the original. Readers see the old file or the new one, never a
///   partially written state.
/// - The whole read-modify-write runs under an exclusive advisory lock on a
///   sidecar `.lock` file, so concurrent writers (threads or processes) cannot
///   lose each other's intervals. Reads take a shared lock.
/// - A file written with a different format version is ignored with a
///   warning and replaced on the next write.
///
/// # Examples
///
/// ```rust,ignore
/// use semiocache::DiskStore;
///
/// let store = DiskStore::new("/var/cache/events.json").validate()?;
/// ```
///
/// # Performance
///
/// Every operation parses the whole file; suited to the few thousand ranges
/// and events a development tool caches, not to an indexer's database.
#[derive(Debug)]
pub struct DiskStore {
    paths: StorePaths,
    /// Serializes writers of this process before they contend for the file lock
    writer: Mutex<()>,
}

impl DiskStore {
    /// Creates a store at the specified path
    ///
    /// The file is created on the first save. Path validation is NOT
    /// performed until the first I/O operation; use
    /// [`validate()`](Self::validate) to check the path immediately.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: StorePaths::new(path.into()),
            writer: Mutex::new(()),
        }
    }

    /// Path of the JSON data file
    pub fn path(&self) -> &Path {
        &self.paths.data
    }

    /// Validates the store path and creates the parent directory if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or is not writable.
    pub fn validate(self) -> Result<Self, StoreError> {
        let parent = match self.paths.data.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            Some(_) => PathBuf::from("."),
            None => {
                return Err(StoreError::io(
                    self.paths.data.display().to_string(),
                    "Store path has no parent directory",
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "no parent directory"),
                ))
            }
        };

        if !parent.exists() {
            std::fs::create_dir_all(&parent).map_err(|e| {
                StoreError::io(
                    parent.display().to_string(),
                    "Failed to create store directory",
                    e,
                )
            })?;
            debug!(path = %parent.display(), "Created store directory");
        }

        // Opening the lock file doubles as the writability check
        open_lock_file(&self.paths.lock)?;

        debug!(path = %self.paths.data.display(), "Store path validated successfully");
        Ok(self)
    }

    /// Runs a blocking read of the store file off the async workers
    async fn read<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(StoreData) -> T + Send + 'static,
    {
        let paths = self.paths.clone();
        run_blocking(&self.paths, move || {
            let _lock = lock(&paths.lock, false)?;
            Ok(f(load(&paths.data)?))
        })
        .await
    }

    /// Runs a blocking read-modify-write of the store file under the exclusive lock
    ///
    /// `f` reports whether it changed anything; unchanged data is not rewritten.
    async fn update<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut StoreData) -> (T, bool) + Send + 'static,
    {
        let _writer = self.writer.lock().await;
        let paths = self.paths.clone();
        run_blocking(&self.paths, move || {
            let _lock = lock(&paths.lock, true)?;
            let mut data = load(&paths.data)?;
            let (result, changed) = f(&mut data);
            if changed {
                persist(&paths, &data)?;
            }
            Ok(result)
        })
        .await
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn intervals_reaching(
        &self,
        key: &CacheKey,
        from: BlockNumber,
    ) -> Result<Vec<BlockInterval>, StoreError> {
        let key = key.clone();
        self.read(move |data| {
            data.keys
                .get(&key)
                .map(|state| state.intervals.reaching(from))
                .unwrap_or_default()
        })
        .await
    }

    async fn events_between(
        &self,
        key: &CacheKey,
        from: BlockNumber,
        to: BlockNumber,
    ) -> Result<Vec<CachedEvent>, StoreError> {
        let key = key.clone();
        self.read(move |data| {
            data.keys
                .get(&key)
                .map(|state| state.events.range(from, to))
                .unwrap_or_default()
        })
        .await
    }

    async fn commit_save(
        &self,
        key: &CacheKey,
        from: BlockNumber,
        to: BlockNumber,
        events: Vec<CachedEvent>,
    ) -> Result<BlockInterval, StoreError> {
        let owned_key = key.clone();
        let union = self
            .update(move |data| {
                let union = data
                    .keys
                    .entry(owned_key)
                    .or_default()
                    .apply_save(from, to, events);
                (union, true)
            })
            .await?;
        debug!(key = %key, union = %union, "Committed save (disk)");
        Ok(union)
    }

    async fn clear_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        let prefix = prefix.to_string();
        self.update(move |data| {
            let before = data.keys.len();
            data.keys.retain(|key, _| !key.has_prefix(&prefix));
            let removed = before - data.keys.len();
            (removed, removed > 0)
        })
        .await
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        self.read(|data| {
            let mut stats = StoreStats::default();
            for state in data.keys.values() {
                stats.record(state);
            }
            stats
        })
        .await
    }

    fn name(&self) -> &'static str {
        "DiskStore"
    }
}

/// Moves blocking file work to the blocking pool
///
/// File locks block the calling thread; holding one on an async worker could
/// stall the task that is about to release it.
async fn run_blocking<T, F>(paths: &StorePaths, f: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        StoreError::io(
            paths.data.display().to_string(),
            "Store task failed",
            std::io::Error::other(e),
        )
    })?
}

fn open_lock_file(path: &Path) -> Result<File, StoreError> {
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .map_err(|e| {
            StoreError::io(
                path.display().to_string(),
                "Failed to open store lock file. Ensure the directory is writable.",
                e,
            )
        })
}

/// Acquires the advisory lock, released when the returned file is dropped
fn lock(path: &Path, exclusive: bool) -> Result<File, StoreError> {
    let file = open_lock_file(path)?;
    let locked = if exclusive {
        file.lock()
    } else {
        file.lock_shared()
    };
    locked.map_err(|e| {
        StoreError::io(
            path.display().to_string(),
            "Failed to acquire store lock",
            e,
        )
    })?;
    Ok(file)
}

/// Loads store data; a missing file or a different format version is an empty store
fn load(path: &Path) -> Result<StoreData, StoreError> {
    if !path.exists() {
        debug!(path = %path.display(), "Store file does not exist, using empty store");
        return Ok(StoreData::default());
    }

    let file = File::open(path).map_err(|e| {
        StoreError::io(
            path.display().to_string(),
            "Failed to open store file. Ensure the file is readable.",
            e,
        )
    })?;

    let data: StoreData = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        StoreError::serialization(format!("Failed to parse store file '{}'", path.display()), e)
    })?;

    if data.version != STORE_FORMAT_VERSION {
        warn!(
            path = %path.display(),
            stored_version = data.version,
            current_version = STORE_FORMAT_VERSION,
            "Store version mismatch, ignoring stored data"
        );
        return Ok(StoreData::default());
    }

    debug!(
        path = %path.display(),
        keys = data.keys.len(),
        "Loaded events cache store"
    );
    Ok(data)
}

/// Writes store data through a temp file and renames it into place
fn persist(paths: &StorePaths, data: &StoreData) -> Result<(), StoreError> {
    let json = serde_json::to_vec(data)
        .map_err(|e| StoreError::serialization("Failed to encode store data", e))?;

    std::fs::write(&paths.temp, &json).map_err(|e| {
        StoreError::io(
            paths.temp.display().to_string(),
            "Failed to write store. Ensure the parent directory is writable.",
            e,
        )
    })?;

    std::fs::rename(&paths.temp, &paths.data).map_err(|e| {
        StoreError::io(
            paths.data.display().to_string(),
            format!("Failed to rename store file from '{}'", paths.temp.display()),
            e,
        )
    })?;

    info!(
        path = %paths.data.display(),
        keys = data.keys.len(),
        bytes = json.len(),
        "Saved events cache store"
    );
    Ok(())
}
