//! Two-tier persistent cache for resolved cards
//!
//! A bounded in-memory map in front of an unbounded on-disk store, one JSON
//! file per cache key. Both tiers share a 24-hour freshness window. Caching
//! is a performance optimization: every write failure is logged and
//! swallowed so it can never abort a resolution.

use crate::models::CardRecord;
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

/// Entries older than this are stale in both tiers
const FRESHNESS_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);
/// At most this many fresh entries are loaded into memory at startup
const WARMUP_LIMIT: usize = 50;

/// Deterministic cache key for a card name: case-insensitive, with spaces
/// and slashes folded to underscores and quotes/commas stripped. Applying
/// it twice yields the same key.
pub fn cache_key(name: &str) -> String {
    name.to_lowercase()
        .replace([' ', '/', '\\'], "_")
        .replace(['\'', '"', ','], "")
}

/// Two-tier card cache: memory map first, disk directory behind it
pub struct CardCache {
    cache_dir: PathBuf,
    freshness: Duration,
    memory: Mutex<HashMap<String, CardRecord>>,
}

impl CardCache {
    /// Open (or create) a cache rooted at `cache_dir` and warm the memory
    /// tier from the freshest entries on disk.
    pub fn new(cache_dir: &Path) -> Self {
        Self::with_freshness(cache_dir, FRESHNESS_WINDOW)
    }

    fn with_freshness(cache_dir: &Path, freshness: Duration) -> Self {
        if let Err(e) = std::fs::create_dir_all(cache_dir) {
            log::warn!("Failed to create cache directory: {}", e);
        }

        let cache = Self {
            cache_dir: cache_dir.to_path_buf(),
            freshness,
            memory: Mutex::new(HashMap::new()),
        };
        cache.warm_up();
        cache
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    fn is_fresh_timestamp(&self, record: &CardRecord) -> bool {
        let age = Utc::now().signed_duration_since(record.cached_at);
        // A future timestamp counts as fresh
        age.to_std().map_or(true, |age| age < self.freshness)
    }

    fn is_fresh_mtime(&self, mtime: SystemTime) -> bool {
        mtime.elapsed().map_or(true, |age| age < self.freshness)
    }

    /// Look up a card by name. Checks memory first (evicting a stale hit),
    /// then disk (deleting a stale or corrupt file and repopulating memory
    /// on a fresh hit). Corruption is never surfaced as an error, only as
    /// a forced re-fetch.
    pub fn lookup(&self, name: &str) -> Option<CardRecord> {
        let key = cache_key(name);

        {
            let mut memory = self.memory.lock().unwrap();
            if let Some(record) = memory.get(&key) {
                if self.is_fresh_timestamp(record) {
                    log::debug!("Memory cache hit for {}", key);
                    return Some(record.clone());
                }
                // Stale in memory; evict and fall through to disk
                memory.remove(&key);
            }
        }

        let path = self.entry_path(&key);
        if !path.exists() {
            return None;
        }

        let fresh = std::fs::metadata(&path)
            .and_then(|m| m.modified())
            .map(|mtime| self.is_fresh_mtime(mtime))
            .unwrap_or(false);

        if !fresh {
            log::debug!("Deleting stale cache entry: {}", key);
            let _ = std::fs::remove_file(&path);
            return None;
        }

        match std::fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str::<CardRecord>(&json) {
                Ok(record) => {
                    log::debug!("Disk cache hit for {}", key);
                    self.memory.lock().unwrap().insert(key, record.clone());
                    Some(record)
                }
                Err(e) => {
                    log::warn!("Corrupt cache entry {}, deleting: {}", key, e);
                    let _ = std::fs::remove_file(&path);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read cache entry {}: {}", key, e);
                None
            }
        }
    }

    /// Write a record to both tiers, overwriting any prior entry
    pub fn store(&self, name: &str, record: &CardRecord) {
        let key = cache_key(name);

        match serde_json::to_string(record) {
            Ok(json) => {
                if let Err(e) = std::fs::write(self.entry_path(&key), json) {
                    log::warn!("Failed to write cache entry {}: {}", key, e);
                }
            }
            Err(e) => {
                log::warn!("Failed to serialize card '{}' for caching: {}", record.name, e);
            }
        }

        self.memory.lock().unwrap().insert(key, record.clone());
    }

    /// Delete the entire on-disk cache and clear the memory tier
    pub fn purge_all(&self) {
        if let Err(e) = std::fs::remove_dir_all(&self.cache_dir) {
            log::warn!("Failed to delete cache directory: {}", e);
        }
        if let Err(e) = std::fs::create_dir_all(&self.cache_dir) {
            log::warn!("Failed to recreate cache directory: {}", e);
        }
        self.memory.lock().unwrap().clear();
        log::info!("Card cache cleared");
    }

    /// Sweep stale entries from both tiers. The tiers are swept
    /// independently: a live memory entry does not protect a stale disk
    /// file, and vice versa.
    pub fn purge_stale(&self) {
        let mut removed = 0usize;
        if let Ok(entries) = std::fs::read_dir(&self.cache_dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().map_or(true, |ext| ext != "json") {
                    continue;
                }
                let stale = entry
                    .metadata()
                    .and_then(|m| m.modified())
                    .map(|mtime| !self.is_fresh_mtime(mtime))
                    .unwrap_or(false);
                if stale && std::fs::remove_file(&path).is_ok() {
                    removed += 1;
                }
            }
        }

        let mut memory = self.memory.lock().unwrap();
        let before = memory.len();
        memory.retain(|_, record| self.is_fresh_timestamp(record));
        let evicted = before - memory.len();

        if removed > 0 || evicted > 0 {
            log::info!(
                "Purged stale cache entries: {} on disk, {} in memory",
                removed,
                evicted
            );
        }
    }

    /// Load the most recently written fresh entries into the memory tier,
    /// deleting any file that fails to parse.
    fn warm_up(&self) {
        let entries = match std::fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Failed to scan cache directory: {}", e);
                return;
            }
        };

        let mut fresh: Vec<(PathBuf, SystemTime)> = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            if let Ok(mtime) = entry.metadata().and_then(|m| m.modified()) {
                if self.is_fresh_mtime(mtime) {
                    fresh.push((path, mtime));
                }
            }
        }

        // Keep only the hottest entries in memory
        fresh.sort_by(|a, b| b.1.cmp(&a.1));
        fresh.truncate(WARMUP_LIMIT);

        let mut memory = self.memory.lock().unwrap();
        for (path, _) in fresh {
            let parsed = std::fs::read_to_string(&path)
                .ok()
                .and_then(|json| serde_json::from_str::<CardRecord>(&json).ok());
            match parsed {
                Some(record) => {
                    if let Some(key) = path.file_stem().and_then(|s| s.to_str()) {
                        memory.insert(key.to_string(), record);
                    }
                }
                None => {
                    log::warn!("Deleting corrupt cache file: {}", path.display());
                    let _ = std::fs::remove_file(&path);
                }
            }
        }

        if !memory.is_empty() {
            log::info!("Warmed card cache with {} entries", memory.len());
        }
    }

    /// Number of entries currently in the memory tier
    pub fn memory_len(&self) -> usize {
        self.memory.lock().unwrap().len()
    }
}

#[cfg(test)]
#[path = "card_cache_tests.rs"]
mod tests;
