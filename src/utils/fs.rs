//! Filesystem conventions: project-root discovery and cache-root resolution.

use crate::constants::{ENV_CACHE_DIR, PROJECT_MARKER_DIR};
use crate::core::System;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Walk upward from `start` to the nearest ancestor containing a `.al`
/// marker directory. `None` simply disables pin-file lookup; it is not an
/// error to run outside a project.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(PROJECT_MARKER_DIR).is_dir() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Resolve the cache root: the `AL_CACHE_DIR` override when set and
/// non-blank, otherwise the per-user cache directory plus the fixed `al`
/// subpath.
pub fn resolve_cache_root(system: &dyn System) -> Result<PathBuf> {
    if let Some(dir) = system
        .env_var(ENV_CACHE_DIR)
        .filter(|value| !value.trim().is_empty())
    {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::cache_dir().context("could not determine the user cache directory")?;
    Ok(base.join("al"))
}
