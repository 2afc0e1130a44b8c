//! Advisory file locking for cache fills.
//!
//! Serializes concurrent fills of the same cache entry across independent
//! processes (parallel build agents invoking al simultaneously). The lock is
//! a sidecar file next to the cache entry, held via an OS-level exclusive
//! lock; fills of different versions never contend because locks are per
//! cache path. Sidecar files are created once and reused across fills - the
//! fill path never deletes them.
//!
//! Acquisition is a non-blocking `try_lock_exclusive` in a fixed-interval
//! poll loop with a bounded wait budget, so a wedged peer process can delay a
//! CLI invocation by at most [`LOCK_WAIT_TIMEOUT`]. All lock syscalls run
//! under `spawn_blocking` to keep the tokio runtime responsive.

use crate::constants::{LOCK_POLL_INTERVAL, LOCK_WAIT_TIMEOUT};
use crate::core::AlError;
use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// An exclusive cross-process lock over one cache path. Released (and the
/// descriptor closed) when dropped, on every exit path.
///
/// # Examples
///
/// ```rust,no_run
/// use al_cli::cache::CacheLock;
/// use std::path::Path;
///
/// # async fn example() -> anyhow::Result<()> {
/// // Blocks (bounded) while another process fills the same entry.
/// let lock = CacheLock::acquire(Path::new("/cache/entry.lock")).await?;
/// // ... fill the entry ...
/// drop(lock); // released here, or on any early return
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CacheLock {
    _file: Arc<File>,
    path: PathBuf,
}

impl CacheLock {
    /// Acquire the lock at `path` with the default wait budget and poll
    /// interval.
    pub async fn acquire(path: &Path) -> Result<Self> {
        Self::acquire_with_timeout(path, LOCK_WAIT_TIMEOUT, LOCK_POLL_INTERVAL).await
    }

    /// Acquire the lock at `path`, polling every `poll` until `wait` has
    /// elapsed.
    ///
    /// The sidecar file is opened create-if-absent and never truncated.
    ///
    /// # Errors
    ///
    /// - [`AlError::LockTimeout`] once the wait budget is exhausted
    /// - non-retryable acquisition failures (e.g. permission denied opening
    ///   the sidecar, or a filesystem that rejects locking) propagate
    ///   immediately
    pub async fn acquire_with_timeout(path: &Path, wait: Duration, poll: Duration) -> Result<Self> {
        let lock_path = path.to_path_buf();

        let open_path = lock_path.clone();
        let file = tokio::task::spawn_blocking(move || {
            OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(&open_path)
        })
        .await
        .context("spawn_blocking panicked")?
        .with_context(|| format!("failed to open lock file: {}", lock_path.display()))?;

        let file = Arc::new(file);
        let start = Instant::now();
        loop {
            let file_clone = Arc::clone(&file);
            let locked = tokio::task::spawn_blocking(move || file_clone.try_lock_exclusive())
                .await
                .context("spawn_blocking panicked")?
                .with_context(|| format!("failed to acquire lock on {}", lock_path.display()))?;

            if locked {
                debug!(
                    path = %lock_path.display(),
                    wait_ms = start.elapsed().as_millis(),
                    "cache lock acquired"
                );
                return Ok(Self {
                    _file: file,
                    path: lock_path,
                });
            }

            let elapsed = start.elapsed();
            if elapsed >= wait {
                return Err(AlError::LockTimeout {
                    path: lock_path,
                    waited_secs: wait.as_secs(),
                }
                .into());
            }
            tokio::time::sleep(poll.min(wait - elapsed)).await;
        }
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        // The OS releases the lock when the descriptor closes; unlock
        // explicitly so the release is not deferred by the Arc.
        #[allow(unstable_name_collisions)]
        if let Err(err) = self._file.unlock() {
            debug!(path = %self.path.display(), error = %err, "failed to unlock cache lock");
        }
    }
}
