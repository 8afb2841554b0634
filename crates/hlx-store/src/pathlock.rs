use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Opt-in per-path write serialization.
///
/// The core write path deliberately takes no locks: two concurrent saves to
/// one path race at the atomic-replace step and the kernel picks a winner.
/// Callers that want in-process serialization instead hold a `PathLocks`
/// and funnel each save through [`PathLocks::with_lock`].
///
/// Entries are refcounted by their live guards and evicted as soon as the
/// last holder releases, so the map never grows with the set of paths ever
/// written — only with the paths being written right now.
#[derive(Debug, Default)]
pub struct PathLocks {
    inner: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding this path's lock.
    pub fn with_lock<R>(&self, path: &Path, f: impl FnOnce() -> R) -> R {
        let slot = self.acquire(path);
        let result = {
            let _guard = slot.lock().expect("path lock poisoned");
            f()
        };
        drop(slot);
        self.evict_if_idle(path);
        result
    }

    /// Number of paths currently locked or awaiting eviction.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("path lock map poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn acquire(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().expect("path lock map poisoned");
        map.entry(path.to_path_buf()).or_default().clone()
    }

    fn evict_if_idle(&self, path: &Path) {
        let mut map = self.inner.lock().expect("path lock map poisoned");
        if let Some(slot) = map.get(path) {
            // Strong count 1 means the map holds the only reference.
            if Arc::strong_count(slot) == 1 {
                map.remove(path);
            }
        }
    }
}
