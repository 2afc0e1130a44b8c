//! Target-version resolution.
//!
//! Precedence, highest to lowest: the `AL_VERSION` environment override, the
//! project pin file, the running binary's own version. The resolver is a pure
//! function of its inputs - no caching, no memoization - and reads the pin
//! file exactly once per call, even when the override shadows it; the pinned
//! value is carried in [`ResolvedVersion::shadowed_pin`] so the dispatcher
//! can print the advisory without a second read.

use crate::constants::ENV_VERSION;
use crate::core::{AlError, System};
use crate::version::pin::{PinFile, read_pin};
use crate::version::normalize_version;
use anyhow::Result;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Where the resolved version came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSource {
    /// The running binary's own version (the default, no-op case).
    Current,
    /// The project pin file.
    Pin,
    /// The `AL_VERSION` environment override.
    Override,
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Current => "current",
            Self::Pin => "pin",
            Self::Override => "override",
        };
        write!(f, "{label}")
    }
}

/// The outcome of one resolution: the target version, its provenance, and
/// any advisory text the dispatcher should surface.
#[derive(Debug, Clone)]
pub struct ResolvedVersion {
    /// Normalized target version, or the `dev` sentinel.
    pub version: String,
    pub source: VersionSource,
    /// Soft-fail warning from the pin reader, if any.
    pub pin_warning: Option<String>,
    /// When the override wins over a valid pin, the pinned value it shadows.
    pub shadowed_pin: Option<String>,
}

/// Resolve the version this invocation should dispatch to.
///
/// `current_version` must already be normalized. `project_root` of `None`
/// disables pin lookup (no enclosing project).
///
/// # Errors
///
/// A malformed `AL_VERSION` override fails immediately - it is user-supplied
/// and should fail loudly rather than degrade. Pin-file read failures
/// propagate from [`read_pin`].
pub fn resolve_version(
    current_version: &str,
    project_root: Option<&Path>,
    system: &dyn System,
) -> Result<ResolvedVersion> {
    let pin = match project_root {
        Some(root) => read_pin(root, system)?,
        None => PinFile::Absent,
    };
    let (pinned, pin_warning) = match pin {
        PinFile::Pinned(version) => (Some(version), None),
        PinFile::Invalid(warning) => (None, Some(warning)),
        PinFile::Absent => (None, None),
    };

    let override_value = system
        .env_var(ENV_VERSION)
        .filter(|value| !value.trim().is_empty());
    if let Some(raw) = override_value {
        let version = normalize_version(&raw).map_err(|err| match err {
            AlError::InvalidVersion { input, reason } => AlError::InvalidVersion {
                input: format!("{ENV_VERSION}={input}"),
                reason,
            },
            other => other,
        })?;
        debug!(%version, "version forced by {ENV_VERSION}");
        return Ok(ResolvedVersion {
            version,
            source: VersionSource::Override,
            pin_warning,
            shadowed_pin: pinned,
        });
    }

    if let Some(version) = pinned {
        debug!(%version, "version pinned by project");
        return Ok(ResolvedVersion {
            version,
            source: VersionSource::Pin,
            pin_warning,
            shadowed_pin: None,
        });
    }

    Ok(ResolvedVersion {
        version: current_version.to_string(),
        source: VersionSource::Current,
        pin_warning,
        shadowed_pin: None,
    })
}
