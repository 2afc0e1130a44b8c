//! Version handling for dispatch: normalization, the `dev` sentinel, the
//! project pin file, and the resolution precedence chain.
//!
//! Versions flow through the dispatcher as normalized strings so that
//! comparisons are plain equality: `v0.6.1`, `V0.6.1`, and `0.6.1` all
//! normalize to `0.6.1`. The literal `dev` is accepted verbatim - it is the
//! version reported by unreleased builds and never a valid hand-off target.

use crate::core::AlError;

pub mod pin;
pub mod resolver;

pub use pin::{PinFile, read_pin};
pub use resolver::{ResolvedVersion, VersionSource, resolve_version};

/// Version sentinel reported by unreleased builds.
pub const VERSION_DEV: &str = "dev";

/// Normalize a version string: trim whitespace, strip one leading `v`/`V`,
/// and validate as semver. The literal `dev` passes through unchanged.
///
/// # Errors
///
/// Returns [`AlError::InvalidVersion`] for blank input or anything the
/// `semver` crate rejects.
pub fn normalize_version(input: &str) -> Result<String, AlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AlError::InvalidVersion {
            input: input.to_string(),
            reason: "empty version string".to_string(),
        });
    }
    if trimmed == VERSION_DEV {
        return Ok(VERSION_DEV.to_string());
    }
    let bare = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    match semver::Version::parse(bare) {
        Ok(version) => Ok(version.to_string()),
        Err(err) => Err(AlError::InvalidVersion {
            input: input.to_string(),
            reason: err.to_string(),
        }),
    }
}

/// Whether a normalized version is the `dev` sentinel.
pub fn is_dev(version: &str) -> bool {
    version == VERSION_DEV
}
