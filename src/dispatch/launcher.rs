//! Process hand-off strategies.
//!
//! Handing control to a cached binary is platform-dependent: POSIX systems
//! replace the current process image in place (no parent survives, no extra
//! PID), while platforms without `exec` semantics spawn the child, wait, and
//! forward its exit code. The dispatcher stays agnostic by talking to the
//! [`ProcessLauncher`] trait; [`default_launcher`] picks the variant at the
//! platform boundary.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// Hands control of this invocation to another binary.
pub trait ProcessLauncher: Send + Sync {
    /// Run `binary` with `args` and exactly the environment `env`.
    ///
    /// For in-place replacement this only returns on failure; for
    /// spawn-and-forward it returns the child's exit code. Either way a
    /// successful hand-off means the caller's remaining job is to exit.
    fn launch(&self, binary: &Path, args: &[OsString], env: &[(OsString, OsString)])
    -> Result<i32>;
}

/// In-place process replacement via `exec`. POSIX only.
#[cfg(unix)]
pub struct ExecLauncher;

#[cfg(unix)]
impl ProcessLauncher for ExecLauncher {
    fn launch(
        &self,
        binary: &Path,
        args: &[OsString],
        env: &[(OsString, OsString)],
    ) -> Result<i32> {
        use std::os::unix::process::CommandExt;

        let mut command = Command::new(binary);
        command
            .args(args)
            .env_clear()
            .envs(env.iter().map(|(key, value)| (key, value)));
        // exec never returns on success; the running image is replaced.
        let err = command.exec();
        Err(anyhow::Error::new(err)
            .context(format!("failed to exec {}", binary.display())))
    }
}

/// Spawn the child, wait for it, and forward its exit code. Used where
/// in-place replacement is unavailable, and by tests that need the parent to
/// survive the hand-off.
pub struct SpawnLauncher;

impl ProcessLauncher for SpawnLauncher {
    fn launch(
        &self,
        binary: &Path,
        args: &[OsString],
        env: &[(OsString, OsString)],
    ) -> Result<i32> {
        let status = Command::new(binary)
            .args(args)
            .env_clear()
            .envs(env.iter().map(|(key, value)| (key, value)))
            .status()
            .with_context(|| format!("failed to spawn {}", binary.display()))?;
        Ok(status.code().unwrap_or(1))
    }
}

/// The hand-off strategy for the current platform.
pub fn default_launcher() -> Box<dyn ProcessLauncher> {
    #[cfg(unix)]
    {
        Box::new(ExecLauncher)
    }
    #[cfg(not(unix))]
    {
        Box::new(SpawnLauncher)
    }
}
