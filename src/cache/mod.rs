//! The versioned binary cache.
//!
//! Given a resolved version, [`BinaryCache::ensure_version`] returns a local
//! executable path, downloading and verifying the release asset first if it
//! is absent. Entries live at
//! `<cache-root>/versions/<version>/<os>-<arch>/<asset>` and are immutable
//! once installed: they are only ever created by an atomic rename of a fully
//! verified temp file, never overwritten in place. Concurrent fills of the
//! same entry are serialized by the per-entry [`CacheLock`]; fills of
//! different versions never contend.
//!
//! Failure discipline: any failure before the final rename leaves the cache
//! untouched. The temp file is removed on every failure path (RAII via
//! [`tempfile::TempPath`]), so a partially written or corrupt entry is never
//! observable from outside the lock.

use crate::constants::{
    CHECKSUM_MANIFEST_NAME, DEFAULT_MAX_DOWNLOAD_BYTES, ENV_MAX_DOWNLOAD_BYTES, ENV_NO_NETWORK,
    HTTP_REQUEST_TIMEOUT, RELEASE_BASE_URL,
};
use crate::core::{AlError, System};
use crate::utils::platform::Platform;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

mod download;
pub mod lock;

pub use lock::CacheLock;

/// The on-disk cache of versioned al binaries for one platform.
pub struct BinaryCache<'a> {
    root: PathBuf,
    platform: Platform,
    base_url: String,
    client: reqwest::Client,
    network_disabled: bool,
    max_download_bytes: u64,
    system: &'a dyn System,
}

impl<'a> BinaryCache<'a> {
    /// Create a cache rooted at `root` for `platform`, reading the
    /// no-network flag and download ceiling from the environment.
    pub fn new(root: PathBuf, platform: Platform, system: &'a dyn System) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            root,
            platform,
            base_url: RELEASE_BASE_URL.to_string(),
            client,
            network_disabled: system
                .env_var(ENV_NO_NETWORK)
                .is_some_and(|value| !value.is_empty()),
            max_download_bytes: parse_max_download_bytes(
                system.env_var(ENV_MAX_DOWNLOAD_BYTES).as_deref(),
            ),
            system,
        })
    }

    /// Point the cache at a different release host (mirrors, tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The path the binary for `version` materializes at.
    pub fn entry_path(&self, version: &str) -> PathBuf {
        self.root
            .join("versions")
            .join(version)
            .join(self.platform.to_string())
            .join(self.platform.asset_name())
    }

    /// Return the local path of the binary for `version`, filling the cache
    /// if needed.
    ///
    /// Idempotent: the common already-cached case is a lock-free existence
    /// check. A miss takes the per-entry advisory lock, re-checks (another
    /// process may have finished the same fill meanwhile), then downloads,
    /// verifies, and atomically installs.
    ///
    /// # Errors
    ///
    /// - [`AlError::NotCached`] on a miss while the no-network flag is set
    /// - [`AlError::LockTimeout`] when a concurrent fill holds the lock past
    ///   the wait budget
    /// - download, integrity, and I/O failures from the fill itself
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use al_cli::cache::BinaryCache;
    /// use al_cli::core::RealSystem;
    /// use al_cli::utils::platform::Platform;
    /// use std::path::PathBuf;
    ///
    /// # async fn example() -> anyhow::Result<()> {
    /// let system = RealSystem;
    /// let cache = BinaryCache::new(
    ///     PathBuf::from("/home/user/.cache/al"),
    ///     Platform::current()?,
    ///     &system,
    /// )?;
    /// let binary = cache.ensure_version("0.6.1").await?;
    /// println!("cached at {}", binary.display());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn ensure_version(&self, version: &str) -> Result<PathBuf> {
        let target = self.entry_path(version);

        if target.exists() {
            debug!(path = %target.display(), "cache hit");
            return Ok(target);
        }

        if self.network_disabled {
            return Err(AlError::NotCached {
                version: version.to_string(),
                path: target,
            }
            .into());
        }

        let parent = target
            .parent()
            .context("cache entry path has no parent directory")?
            .to_path_buf();
        tokio::fs::create_dir_all(&parent)
            .await
            .with_context(|| format!("failed to create cache directory {}", parent.display()))?;

        let lock_path = lock_sidecar_path(&target);
        let _lock = CacheLock::acquire(&lock_path).await?;

        // Re-check under the lock: a concurrent process may have completed
        // this exact fill while we waited.
        if target.exists() {
            debug!(path = %target.display(), "entry filled by a concurrent process");
            return Ok(target);
        }

        self.fill_entry(version, &target, &parent).await?;
        Ok(target)
    }

    /// Download, verify, and atomically install one cache entry. Runs with
    /// the entry lock held.
    async fn fill_entry(&self, version: &str, target: &Path, dir: &Path) -> Result<()> {
        let asset = self.platform.asset_name();

        // Temp file in the target directory so the final rename stays on one
        // filesystem and is atomic. Dropping `temp_path` unlinks the file,
        // which covers every failure exit below.
        let temp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
        let (file, temp_path) = temp.into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let asset_url = download::release_url(&self.base_url, version, &asset);
        info!(%version, url = %asset_url, "downloading release asset");
        download::fetch_asset(
            &self.client,
            &asset_url,
            &mut file,
            self.max_download_bytes,
            version,
        )
        .await?;
        file.sync_all()
            .await
            .context("failed to flush downloaded binary to disk")?;
        drop(file);

        let manifest_url = download::release_url(&self.base_url, version, CHECKSUM_MANIFEST_NAME);
        let expected = download::fetch_expected_checksum(
            &self.client,
            &manifest_url,
            &asset,
            self.max_download_bytes,
            version,
        )
        .await?;
        let actual = download::compute_sha256(&temp_path).await?;
        if !actual.eq_ignore_ascii_case(&expected) {
            return Err(AlError::ChecksumMismatch {
                asset,
                expected,
                actual,
            }
            .into());
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o755))
                .await
                .with_context(|| format!("failed to mark {} executable", temp_path.display()))?;
        }

        temp_path
            .persist(target)
            .with_context(|| format!("failed to install binary at {}", target.display()))?;

        self.system
            .status(&format!("downloaded al {version} ({})", self.platform));
        Ok(())
    }
}

/// Sidecar lock path for a cache entry: the entry path plus a `.lock`
/// suffix appended (not an extension swap; asset names contain no dot).
fn lock_sidecar_path(entry: &Path) -> PathBuf {
    let mut os = entry.to_path_buf().into_os_string();
    os.push(".lock");
    PathBuf::from(os)
}

/// Parse the download ceiling override; invalid or non-positive values fall
/// back to the built-in default.
fn parse_max_download_bytes(raw: Option<&str>) -> u64 {
    match raw.and_then(|value| value.trim().parse::<u64>().ok()) {
        Some(bytes) if bytes > 0 => bytes,
        _ => DEFAULT_MAX_DOWNLOAD_BYTES,
    }
}
