use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::{ArcMutexGuard, Mutex, RawMutex};

/// Process-wide registry shared by every store, so two stores opened on the
/// same reports directory still serialize their writes.
static PARTITION_LOCKS: Lazy<PartitionLocks> = Lazy::new(PartitionLocks::new);

pub fn global() -> &'static PartitionLocks {
    &PARTITION_LOCKS
}

/// One mutex per resolved partition file path.
#[derive(Debug, Default)]
pub struct PartitionLocks {
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl PartitionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock for `path` is held. The lock is released when the
    /// returned guard drops, including on early return or unwind.
    pub fn acquire(&self, path: &Path) -> PartitionGuard {
        let mutex = self
            .locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        // The map shard is unlocked here; only the partition mutex is held.
        PartitionGuard {
            _guard: mutex.lock_arc(),
            path: path.to_path_buf(),
        }
    }

    pub fn tracked_paths(&self) -> usize {
        self.locks.len()
    }
}

pub struct PartitionGuard {
    _guard: ArcMutexGuard<RawMutex, ()>,
    path: PathBuf,
}

impl PartitionGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for PartitionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionGuard").field("path", &self.path).finish()
    }
}
