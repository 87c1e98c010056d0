use std::collections::HashMap;
use std::hash::{BuildHasher, RandomState};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;

/// Default number of shards used by [`Store::new`]
pub const DEFAULT_SHARDS: usize = 16;

type Shard = RwLock<HashMap<Bytes, Bytes>>;

/// In-memory key-value store
///
/// Keys are spread over a fixed set of shards, each guarded by its own
/// reader-writer lock. A key always lands on the same shard, so every
/// operation on one key is serialized while reads run in parallel.
pub struct Store {
    shards: Box<[Shard]>,
    hasher: RandomState,
}

impl Store {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Create a new empty store split into `shards` locks (at least one)
    pub fn with_shards(shards: usize) -> Self {
        let shards = (0..shards.max(1))
            .map(|_| RwLock::new(HashMap::new()))
            .collect();
        Self {
            shards,
            hasher: RandomState::new(),
        }
    }

    /// Number of shards backing this store
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard(&self, key: &[u8]) -> &Shard {
        let idx = (self.hasher.hash_one(key) % self.shards.len() as u64) as usize;
        &self.shards[idx]
    }

    // A writer that panicked never leaves a half-inserted value behind,
    // so a poisoned map is still consistent.
    fn read(shard: &Shard) -> RwLockReadGuard<'_, HashMap<Bytes, Bytes>> {
        shard.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(shard: &Shard) -> RwLockWriteGuard<'_, HashMap<Bytes, Bytes>> {
        shard.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or overwrite the value bound to `key`
    pub fn put(&self, key: impl Into<Bytes>, value: impl Into<Bytes>) {
        let key = key.into();
        let value = value.into();
        Self::write(self.shard(&key)).insert(key, value);
    }

    /// Get the value bound to `key`, `None` when absent
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        Self::read(self.shard(key)).get(key).cloned()
    }

    /// Remove `key`, returning whether it was bound beforehand
    pub fn delete(&self, key: &[u8]) -> bool {
        Self::write(self.shard(key)).remove(key).is_some()
    }

    /// Number of bindings. Shards are counted one after another, so the
    /// total is not a snapshot while writers are active.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| Self::read(s).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
