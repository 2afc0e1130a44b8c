//! Shared test utilities.
//!
//! [`FakeSystem`] is an in-memory [`System`] implementation: tests script the
//! environment and pin-file contents per instance instead of mutating global
//! process state, and captured warning/status lines can be asserted on.
//! Available to unit tests and, via the `test-utils` feature, to the
//! integration suite.

use crate::core::System;
use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// An in-memory [`System`] for tests.
#[derive(Default)]
pub struct FakeSystem {
    env: HashMap<String, String>,
    files: HashMap<PathBuf, String>,
    unreadable: Vec<PathBuf>,
    warnings: Mutex<Vec<String>>,
    statuses: Mutex<Vec<String>>,
}

impl FakeSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an environment variable visible to the code under test.
    #[must_use]
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Provide the contents served for `path` by [`System::read_file`].
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }

    /// Make `path` fail with a permission error instead of `NotFound`.
    #[must_use]
    pub fn with_unreadable_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.unreadable.push(path.into());
        self
    }

    /// Warning lines emitted so far.
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }

    /// Status/progress lines emitted so far.
    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().unwrap().clone()
    }
}

impl System for FakeSystem {
    fn env_var(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }

    fn env_vars(&self) -> Vec<(OsString, OsString)> {
        self.env
            .iter()
            .map(|(key, value)| (OsString::from(key), OsString::from(value)))
            .collect()
    }

    fn read_file(&self, path: &Path) -> io::Result<String> {
        if self.unreadable.iter().any(|p| p == path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }
        match self.files.get(path) {
            Some(contents) => Ok(contents.clone()),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "file not found")),
        }
    }

    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }

    fn status(&self, message: &str) {
        self.statuses.lock().unwrap().push(message.to_string());
    }
}
