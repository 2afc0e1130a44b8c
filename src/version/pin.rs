//! Project pin file reader.
//!
//! A project pins the al version it wants by writing it to
//! `<root>/.al/al.version`. The format is deliberately plain text: blank
//! lines and `#`-comment lines are ignored, and exactly one version line must
//! remain. Every malformed shape (empty, ambiguous, unparseable) degrades to
//! a warning rather than an error so dispatch can fall back to the running
//! binary's own version while still surfacing the problem on stderr. Only a
//! genuine read failure - anything other than "file does not exist" - is a
//! hard error, because "no pin" and "cannot read pin" must not be confused.

use crate::constants::{PIN_FILE_NAME, PROJECT_MARKER_DIR};
use crate::core::System;
use crate::version::normalize_version;
use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Outcome of reading the pin file. `Invalid` carries the warning text that
/// the dispatcher prints before falling back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinFile {
    /// No pin file exists.
    Absent,
    /// The pin file names exactly one valid version (normalized).
    Pinned(String),
    /// The pin file exists but is unusable; dispatch proceeds without it.
    Invalid(String),
}

/// Read and parse `<project_root>/.al/al.version`.
///
/// # Errors
///
/// Only I/O failures other than `NotFound` are errors; all content problems
/// are reported as [`PinFile::Invalid`].
pub fn read_pin(project_root: &Path, system: &dyn System) -> Result<PinFile> {
    let path = project_root.join(PROJECT_MARKER_DIR).join(PIN_FILE_NAME);
    let contents = match system.read_file(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no pin file");
            return Ok(PinFile::Absent);
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read pin file {}", path.display()));
        }
    };

    // Line numbers are 1-based and refer to the raw file, comments included.
    let lines: Vec<(usize, &str)> = contents
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .collect();

    match lines.as_slice() {
        [] => Ok(PinFile::Invalid(format!(
            "pin file {} is empty",
            path.display()
        ))),
        [(_, line)] => match normalize_version(line) {
            Ok(version) => {
                debug!(path = %path.display(), %version, "pinned version");
                Ok(PinFile::Pinned(version))
            }
            Err(err) => Ok(PinFile::Invalid(format!(
                "invalid pinned version in {}: {err}",
                path.display()
            ))),
        },
        [(first, _), (second, _), ..] => Ok(PinFile::Invalid(format!(
            "pin file {} has multiple version lines (line {first} and line {second})",
            path.display()
        ))),
    }
}
