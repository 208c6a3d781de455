//! Store Lock File
//!
//! Serializes writers of a shared file. The lock is a sibling file created
//! exclusively and holding the owner's PID; it lives only for the duration of
//! one read-modify-write and is removed on drop. A lock left by a process that
//! no longer exists is treated as stale and replaced, as is one whose PID
//! cannot be read once it is older than a short grace period.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use super::StorageError;

/// Pause between attempts while another writer holds the lock.
const RETRY_INTERVAL: Duration = Duration::from_millis(25);

/// Age after which a lock file without a readable PID counts as abandoned.
const UNREADABLE_LOCK_GRACE: Duration = Duration::from_secs(1);

/// Exclusive lock on a store file, released on drop.
#[derive(Debug)]
pub struct StoreLock {
    lock_path: PathBuf,
    owned: bool,
}

impl StoreLock {
    /// Lock path used for a store file: `<file>.lock`.
    pub fn lock_path_for(store: &Path) -> PathBuf {
        let mut name = store.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".lock");
        store.with_file_name(name)
    }

    /// Acquire the lock for `store`, waiting up to `timeout` for another writer.
    pub fn acquire(store: &Path, timeout: Duration) -> Result<Self, StorageError> {
        let lock_path = Self::lock_path_for(store);
        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::Io(parent.to_path_buf(), e))?;
        }

        let started = Instant::now();
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&lock_path) {
                Ok(mut file) => {
                    let pid = std::process::id();
                    if let Err(e) = writeln!(file, "{pid}") {
                        let _ = fs::remove_file(&lock_path);
                        return Err(StorageError::Io(lock_path, e));
                    }
                    tracing::debug!(path = %lock_path.display(), pid, "Acquired store lock");
                    return Ok(Self { lock_path, owned: true });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    let holder = Self::holder(&lock_path);
                    if let Some(pid) = holder.filter(|pid| !Self::is_process_running(*pid)) {
                        tracing::info!(path = %lock_path.display(), pid, "Removing stale store lock");
                        let _ = fs::remove_file(&lock_path);
                        continue;
                    }
                    if holder.is_none() && Self::age(&lock_path) >= Some(timeout.min(UNREADABLE_LOCK_GRACE)) {
                        tracing::info!(path = %lock_path.display(), "Removing store lock with no readable PID");
                        let _ = fs::remove_file(&lock_path);
                        continue;
                    }
                    if started.elapsed() >= timeout {
                        return Err(StorageError::Locked { path: lock_path, holder });
                    }
                    thread::sleep(RETRY_INTERVAL);
                }
                Err(e) => return Err(StorageError::Io(lock_path, e)),
            }
        }
    }

    /// PID recorded in an existing lock file, if readable.
    fn holder(lock_path: &Path) -> Option<u32> {
        fs::read_to_string(lock_path).ok()?.trim().parse().ok()
    }

    /// Time since the lock file was last written.
    fn age(lock_path: &Path) -> Option<Duration> {
        let modified = fs::metadata(lock_path).ok()?.modified().ok()?;
        Some(modified.elapsed().unwrap_or_default())
    }

    #[cfg(unix)]
    fn is_process_running(pid: u32) -> bool {
        Path::new(&format!("/proc/{pid}")).exists()
    }

    #[cfg(not(unix))]
    fn is_process_running(_pid: u32) -> bool {
        // No cheap liveness check; never steal the lock
        true
    }

    /// Release the lock (called automatically on drop)
    pub fn release(&mut self) {
        if self.owned {
            if let Err(e) = fs::remove_file(&self.lock_path) {
                tracing::warn!(path = %self.lock_path.display(), error = %e, "Failed to remove store lock");
            } else {
                tracing::debug!(path = %self.lock_path.display(), "Released store lock");
            }
            self.owned = false;
        }
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_acquire_writes_pid() {
        let dir = tempdir().unwrap();
        let lock = StoreLock::acquire(&dir.path().join("prefs.json"), Duration::ZERO).unwrap();
        assert_eq!(lock.path(), dir.path().join("prefs.json.lock"));
        let pid: u32 = fs::read_to_string(lock.path()).unwrap().trim().parse().unwrap();
        assert_eq!(pid, std::process::id());
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = tempdir().unwrap();
        let store = dir.path().join("prefs.json");
        let lock_path = {
            let lock = StoreLock::acquire(&store, Duration::ZERO).unwrap();
            lock.path().to_path_buf()
        };
        assert!(!lock_path.exists());
        assert!(StoreLock::acquire(&store, Duration::ZERO).is_ok());
    }

    #[test]
    fn test_held_lock_times_out() {
        let dir = tempdir().unwrap();
        let store = dir.path().join("prefs.json");
        let _held = StoreLock::acquire(&store, Duration::ZERO).unwrap();
        let err = StoreLock::acquire(&store, Duration::from_millis(60)).unwrap_err();
        assert!(matches!(err, StorageError::Locked { holder: Some(_), .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_stale_lock_replaced() {
        let dir = tempdir().unwrap();
        let store = dir.path().join("prefs.json");
        fs::write(StoreLock::lock_path_for(&store), "999999999\n").unwrap();
        assert!(StoreLock::acquire(&store, Duration::ZERO).is_ok());
    }

    #[test]
    fn test_empty_lock_is_reclaimed_after_grace() {
        let dir = tempdir().unwrap();
        let store = dir.path().join("prefs.json");
        fs::write(StoreLock::lock_path_for(&store), "").unwrap();

        let lock = StoreLock::acquire(&store, Duration::from_secs(5)).unwrap();
        let pid: u32 = fs::read_to_string(lock.path()).unwrap().trim().parse().unwrap();
        assert_eq!(pid, std::process::id());
    }
}
