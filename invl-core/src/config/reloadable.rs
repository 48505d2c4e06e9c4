//! Versioned, hot-swappable config section.
//!
//! `Reloadable<T>` wraps `Arc<RwLock<T>>` and counts replacements so a
//! reload can report which generation is live.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, RwLockReadGuard};

pub struct Reloadable<T> {
    inner: Arc<ReloadableInner<T>>,
}

struct ReloadableInner<T> {
    data: RwLock<T>,
    version: AtomicU64,
}

impl<T> Reloadable<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Arc::new(ReloadableInner {
                data: RwLock::new(initial),
                version: AtomicU64::new(0),
            }),
        }
    }

    /// Swap in a new value and return the new version.
    pub async fn replace(&self, value: T) -> u64 {
        let mut guard = self.inner.data.write().await;
        *guard = value;
        self.inner.version.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.data.read().await
    }

    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Relaxed)
    }
}

impl<T: Clone> Reloadable<T> {
    /// Copy of the current value, for callers that must not hold the lock
    /// across an await point.
    pub async fn snapshot(&self) -> T {
        self.inner.data.read().await.clone()
    }
}

impl<T> Clone for Reloadable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Reloadable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reloadable")
            .field("version", &self.version())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replace_is_visible_to_clones() {
        let section = Reloadable::new(1u32);
        let other = section.clone();
        assert_eq!(section.version(), 0);

        assert_eq!(other.replace(2).await, 1);
        assert_eq!(*section.read().await, 2);
        assert_eq!(section.snapshot().await, 2);
        assert_eq!(section.version(), 1);
    }
}
