//! The dispatcher: decides on every invocation whether the running binary is
//! the version that should execute, and if not, fetches the right one and
//! hands control to it.
//!
//! The flow is a small state machine: validate preconditions, normalize the
//! build version, resolve the target (override > pin > current), then either
//! stop (already the right version - the common case, which must stay cheap:
//! no network, no lock), fail (recursion guard, `dev` target), or fill the
//! cache and hand off. A hand-off is irreversible, so it is only attempted
//! after the cache fill has fully completed and its lock and temp state have
//! been released.

use crate::cache::BinaryCache;
use crate::constants::{ENV_DISPATCH_GUARD, ENV_VERSION};
use crate::core::{AlError, System};
use crate::utils::fs::{find_project_root, resolve_cache_root};
use crate::utils::platform::Platform;
use crate::version::{VersionSource, is_dev, normalize_version, resolve_version};
use anyhow::Result;
use std::ffi::OsString;
use std::path::Path;
use tracing::{debug, info};

pub mod launcher;

pub use launcher::{ProcessLauncher, SpawnLauncher, default_launcher};
#[cfg(unix)]
pub use launcher::ExecLauncher;

/// Outcome of a dispatch attempt.
///
/// `HandedOff` is how "control went elsewhere" is reported on platforms
/// where the parent survives the hand-off: the caller's only remaining job
/// is to exit with the child's code. On exec platforms a successful hand-off
/// never returns at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The running binary is already the resolved version; continue with
    /// normal execution.
    Current,
    /// Control was handed to another version; exit with this code.
    HandedOff { code: i32 },
}

/// Version dispatch orchestrator, parameterized over its capabilities for
/// testability.
pub struct Dispatcher<'a> {
    system: &'a dyn System,
    launcher: &'a dyn ProcessLauncher,
}

impl<'a> Dispatcher<'a> {
    pub fn new(system: &'a dyn System, launcher: &'a dyn ProcessLauncher) -> Self {
        Self { system, launcher }
    }

    /// Run one dispatch attempt for the invocation `argv` made from `cwd` by
    /// a binary whose build version is `build_version`.
    ///
    /// # Errors
    ///
    /// Every class of the dispatch taxonomy except soft pin problems, which
    /// are printed as warnings and fall back to the current version.
    pub async fn dispatch(
        &self,
        argv: &[OsString],
        cwd: &Path,
        build_version: &str,
    ) -> Result<Dispatch> {
        if argv.is_empty() {
            return Err(AlError::MissingArgv.into());
        }
        if cwd.as_os_str().is_empty() {
            return Err(AlError::MissingWorkDir.into());
        }

        let current = normalize_version(build_version).map_err(|err| match err {
            AlError::InvalidVersion { input, reason } => {
                AlError::InvalidBuildVersion { version: input, reason }
            }
            other => other,
        })?;

        let project_root = find_project_root(cwd);
        let resolved = resolve_version(&current, project_root.as_deref(), self.system)?;

        if let Some(warning) = &resolved.pin_warning {
            self.system.warn(warning);
        }
        if resolved.source != VersionSource::Current {
            self.system
                .status(&format!("al {} ({})", resolved.version, resolved.source));
        }
        if let Some(pin) = &resolved.shadowed_pin {
            self.system
                .status(&format!("{ENV_VERSION} overrides the pinned version {pin}"));
        }

        if resolved.version == current {
            debug!(version = %current, "running binary matches the resolved version");
            return Ok(Dispatch::Current);
        }

        if self
            .system
            .env_var(ENV_DISPATCH_GUARD)
            .is_some_and(|value| !value.is_empty())
        {
            return Err(AlError::RecursiveDispatch.into());
        }

        if is_dev(&resolved.version) {
            return Err(AlError::DevDispatch.into());
        }

        let cache_root = resolve_cache_root(self.system)?;
        let platform = Platform::current()?;
        let cache = BinaryCache::new(cache_root, platform, self.system)?;
        let binary = cache.ensure_version(&resolved.version).await?;

        let mut env = self.system.env_vars();
        env.retain(|(key, _)| key != ENV_DISPATCH_GUARD);
        env.push((OsString::from(ENV_DISPATCH_GUARD), OsString::from("1")));

        info!(
            version = %resolved.version,
            binary = %binary.display(),
            "handing off to cached version"
        );
        // The cache fill (lock guard, temp file) is fully settled by now;
        // nothing is pending when the process image goes away.
        let code = self.launcher.launch(&binary, &argv[1..], &env)?;
        Ok(Dispatch::HandedOff { code })
    }
}
