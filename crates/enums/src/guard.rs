//! Scoped guard around cache file access.

use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Wait cycles before giving up on a contended cache file.
pub const MAX_WAIT_CYCLES: u32 = 10;

/// Sleep between wait cycles.
pub const WAIT_INTERVAL: Duration = Duration::from_millis(100);

/// Serializes reads and writes of cache files within one process.
///
/// Clones share the same lock. Acquisition is best-effort: after
/// [`MAX_WAIT_CYCLES`] failed attempts the caller proceeds without the lock.
#[derive(Debug, Clone)]
pub struct CacheFileGuard {
    lock: Arc<Mutex<()>>,
    max_waits: u32,
    interval: Duration,
}

impl Default for CacheFileGuard {
    fn default() -> Self {
        Self::with_timing(MAX_WAIT_CYCLES, WAIT_INTERVAL)
    }
}

impl CacheFileGuard {
    /// Guard with the default wait policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Guard with a custom wait policy.
    pub fn with_timing(max_waits: u32, interval: Duration) -> Self {
        Self {
            lock: Arc::new(Mutex::new(())),
            max_waits,
            interval,
        }
    }

    /// Acquire the lock for `label`'s cache file.
    ///
    /// Returns `None` when the lock stayed contended for every wait cycle; the
    /// caller then continues unguarded. The lock is released when the returned
    /// guard drops.
    pub fn acquire(&self, label: &str) -> Option<MutexGuard<'_, ()>> {
        let mut waits = 0;
        loop {
            match self.lock.try_lock() {
                Ok(guard) => return Some(guard),
                Err(TryLockError::Poisoned(poisoned)) => return Some(poisoned.into_inner()),
                Err(TryLockError::WouldBlock) => {}
            }
            if waits >= self.max_waits {
                warn!("Maximum wait time exceeded for {label} cache file. Proceeding without the lock");
                return None;
            }
            waits += 1;
            debug!("{label} cache file in use. Wait cycle {waits}");
            thread::sleep(self.interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquires_when_free_and_releases_on_drop() {
        let guard = CacheFileGuard::new();
        {
            let held = guard.acquire("TechType");
            assert!(held.is_some());
        }
        assert!(guard.acquire("TechType").is_some());
    }

    #[test]
    fn gives_up_after_bounded_waits() {
        let guard = CacheFileGuard::with_timing(3, Duration::from_millis(1));
        let other = guard.clone();
        let _held = guard.acquire("TechType").unwrap();
        assert!(other.acquire("TechType").is_none());
    }

    #[test]
    fn waits_for_a_short_holder() {
        let guard = CacheFileGuard::with_timing(50, Duration::from_millis(5));
        let other = guard.clone();
        let holder = thread::spawn(move || {
            let _held = other.acquire("CraftTreeType");
            thread::sleep(Duration::from_millis(20));
        });
        thread::sleep(Duration::from_millis(5));
        assert!(guard.acquire("CraftTreeType").is_some());
        holder.join().unwrap();
    }
}
