//! The [`System`] capability boundary.
//!
//! The dispatch core touches the outside world through this trait instead of
//! calling `std::env`/`std::fs` directly: environment reads, pin-file reads,
//! and the stderr sink for warnings and progress lines. Production code uses
//! [`RealSystem`]; tests inject `FakeSystem` from `test_utils` to script
//! environments and capture output without global state.
//!
//! Process replacement is deliberately a separate capability
//! ([`crate::dispatch::launcher::ProcessLauncher`]) because it is selected per
//! platform, not per test.

use std::ffi::OsString;
use std::io;
use std::path::Path;

/// Access to environment, file reads, and the user-visible stderr stream.
pub trait System: Send + Sync {
    /// Read an environment variable. Returns `None` when unset; callers that
    /// treat blank as unset filter explicitly.
    fn env_var(&self, name: &str) -> Option<String>;

    /// Snapshot of the full environment, used to build the child environment
    /// for a hand-off.
    fn env_vars(&self) -> Vec<(OsString, OsString)>;

    /// Read a file to a string. A `NotFound` error kind is meaningful to
    /// callers (missing pin file is not an error).
    fn read_file(&self, path: &Path) -> io::Result<String>;

    /// Emit a warning line for the user.
    fn warn(&self, message: &str);

    /// Emit a plain status/progress line for the user.
    fn status(&self, message: &str);
}

/// The production [`System`]: process environment, real filesystem, stderr.
pub struct RealSystem;

impl System for RealSystem {
    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn env_vars(&self) -> Vec<(OsString, OsString)> {
        std::env::vars_os().collect()
    }

    fn read_file(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn warn(&self, message: &str) {
        use colored::Colorize;
        eprintln!("{} {message}", "warning:".yellow().bold());
    }

    fn status(&self, message: &str) {
        eprintln!("{message}");
    }
}
