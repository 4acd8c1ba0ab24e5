use std::collections::hash_map::RandomState;
use std::collections::{HashMap, VecDeque};
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard};

/// Outcome of one [`TimestampStore::admit`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Whether `now` was recorded.
    pub allowed: bool,
    /// Timestamps inside the window after pruning (and after recording, if allowed).
    pub in_window: usize,
    /// Oldest timestamp still inside the window.
    pub oldest: Option<u64>,
}

/// Storage for per-key request timestamps.
///
/// The prune-check-append sequence for one key must happen under a single
/// critical section; that is what keeps the recorded count at or below
/// `max_requests` when several threads hit the same key.
pub trait TimestampStore: Send + Sync + std::fmt::Debug {
    /// Drop `key`'s timestamps at or before `now - window_ms`, then record `now`
    /// if fewer than `max_requests` remain.
    fn admit(&self, key: &str, now: u64, window_ms: u64, max_requests: usize) -> Admission;

    /// Drop every key whose newest timestamp has left that key's window.
    /// Returns how many keys were removed.
    fn sweep(&self, now: u64) -> usize;

    /// Number of keys currently held.
    fn tracked_keys(&self) -> usize;

    /// Timestamps currently held for `key`, pruned or not.
    fn recorded(&self, key: &str) -> usize;
}

#[derive(Debug)]
struct WindowEntry {
    stamps: VecDeque<u64>,
    window_ms: u64,
}

impl WindowEntry {
    fn expired(&self, now: u64) -> bool {
        match (self.stamps.back(), now.checked_sub(self.window_ms)) {
            (None, _) => true,
            (Some(&newest), Some(window_start)) => newest <= window_start,
            (Some(_), None) => false,
        }
    }
}

#[derive(Debug, Default)]
struct WindowMap {
    entries: HashMap<String, WindowEntry>,
}

impl WindowMap {
    fn admit(&mut self, key: &str, now: u64, window_ms: u64, max_requests: usize) -> Admission {
        let entry = self
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| WindowEntry { stamps: VecDeque::new(), window_ms });
        entry.window_ms = window_ms;

        // Before the clock has run for a full window nothing can have expired.
        if let Some(window_start) = now.checked_sub(window_ms) {
            while entry.stamps.front().is_some_and(|&t| t <= window_start) {
                entry.stamps.pop_front();
            }
        }

        let allowed = entry.stamps.len() < max_requests;
        if allowed {
            entry.stamps.push_back(now);
        }
        Admission { allowed, in_window: entry.stamps.len(), oldest: entry.stamps.front().copied() }
    }

    fn sweep(&mut self, now: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.expired(now));
        before - self.entries.len()
    }

    fn recorded(&self, key: &str) -> usize {
        self.entries.get(key).map_or(0, |entry| entry.stamps.len())
    }
}

// The map is never left half-updated (no user code runs under the lock), so a
// poisoned guard is safe to reuse.
fn lock(map: &Mutex<WindowMap>) -> MutexGuard<'_, WindowMap> {
    map.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("rate limit store lock poisoned; recovering");
        poisoned.into_inner()
    })
}

/// Simple in-memory timestamp store behind one mutex.
///
/// Clones share the same map.
#[derive(Default, Clone, Debug)]
pub struct InMemoryTimestampStore {
    data: Arc<Mutex<WindowMap>>,
}

impl InMemoryTimestampStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimestampStore for InMemoryTimestampStore {
    fn admit(&self, key: &str, now: u64, window_ms: u64, max_requests: usize) -> Admission {
        lock(&self.data).admit(key, now, window_ms, max_requests)
    }

    fn sweep(&self, now: u64) -> usize {
        lock(&self.data).sweep(now)
    }

    fn tracked_keys(&self) -> usize {
        lock(&self.data).entries.len()
    }

    fn recorded(&self, key: &str) -> usize {
        lock(&self.data).recorded(key)
    }
}

/// Default shard count for [`ShardedTimestampStore`].
pub const DEFAULT_SHARDS: usize = 16;

/// Timestamp store split into independently locked shards.
///
/// Keys are hashed to a shard, so contention is limited to keys that share a
/// shard. Clones share the same shards.
#[derive(Clone, Debug)]
pub struct ShardedTimestampStore {
    shards: Arc<Vec<Mutex<WindowMap>>>,
    hasher: RandomState,
}

impl Default for ShardedTimestampStore {
    fn default() -> Self {
        Self::new(DEFAULT_SHARDS)
    }
}

impl ShardedTimestampStore {
    /// Store with `shards` shards (at least one).
    pub fn new(shards: usize) -> Self {
        let shards = (0..shards.max(1)).map(|_| Mutex::new(WindowMap::default())).collect();
        Self { shards: Arc::new(shards), hasher: RandomState::new() }
    }

    /// Number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard(&self, key: &str) -> &Mutex<WindowMap> {
        let mut hasher = self.hasher.build_hasher();
        key.hash(&mut hasher);
        let index = (hasher.finish() % self.shards.len() as u64) as usize;
        &self.shards[index]
    }
}

impl TimestampStore for ShardedTimestampStore {
    fn admit(&self, key: &str, now: u64, window_ms: u64, max_requests: usize) -> Admission {
        lock(self.shard(key)).admit(key, now, window_ms, max_requests)
    }

    fn sweep(&self, now: u64) -> usize {
        self.shards.iter().map(|shard| lock(shard).sweep(now)).sum()
    }

    fn tracked_keys(&self) -> usize {
        self.shards.iter().map(|shard| lock(shard).entries.len()).sum()
    }

    fn recorded(&self, key: &str) -> usize {
        lock(self.shard(key)).recorded(key)
    }
}
