//! Global constants used throughout the al codebase.
//!
//! This module contains timeout durations, retry parameters, environment
//! variable names, and the release-host layout. Defining them centrally
//! improves maintainability and makes magic numbers more discoverable.

use std::time::Duration;

/// Overrides the computed cache root directory.
pub const ENV_CACHE_DIR: &str = "AL_CACHE_DIR";

/// When set and non-empty, forbids any download; a cache miss becomes a hard error.
pub const ENV_NO_NETWORK: &str = "AL_NO_NETWORK";

/// Forces the target version, bypassing the project pin file.
pub const ENV_VERSION: &str = "AL_VERSION";

/// Set on the child environment during hand-off to prevent recursive dispatch.
/// Internal; never set this by hand.
pub const ENV_DISPATCH_GUARD: &str = "AL_DISPATCHED";

/// Overrides the download size ceiling in bytes. Invalid or non-positive
/// values fall back to [`DEFAULT_MAX_DOWNLOAD_BYTES`].
pub const ENV_MAX_DOWNLOAD_BYTES: &str = "AL_MAX_DOWNLOAD_BYTES";

/// Directory that marks a project root, e.g. `myproject/.al/`.
pub const PROJECT_MARKER_DIR: &str = ".al";

/// Pin file inside the marker directory declaring the version this project
/// dispatches to.
pub const PIN_FILE_NAME: &str = "al.version";

/// Release host serving `<base>/download/v<version>/<asset>`.
pub const RELEASE_BASE_URL: &str = "https://github.com/agentlauncher/al/releases";

/// Name of the checksum manifest published alongside each release.
pub const CHECKSUM_MANIFEST_NAME: &str = "checksums.txt";

/// Maximum time to wait for the per-entry cache lock (30 seconds).
///
/// Bounds worst-case CLI latency while still tolerating a realistic
/// concurrent download of the same version by another process.
pub const LOCK_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Poll interval between non-blocking lock attempts (100 ms).
pub const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Number of retries after a transient network failure. Exactly one; the
/// fixed budget keeps worst-case latency predictable.
pub const NETWORK_RETRIES: u32 = 1;

/// Fixed backoff between the original network attempt and its retry (500 ms).
pub const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Per-request timeout for release-host HTTP calls (30 seconds).
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default ceiling on downloaded response bodies (100 MiB).
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 100 * 1024 * 1024;
