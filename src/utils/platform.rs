//! Platform resolution for release assets.
//!
//! Maps the running OS and CPU architecture onto the identifiers the release
//! pipeline publishes assets under. The allow-list is deliberately fixed:
//! linux and macos, on x86_64 and aarch64. Anything else fails with an
//! unsupported-platform error before any network or cache work happens.

use crate::core::AlError;
use std::fmt;

/// A supported `(os, arch)` pair in release-asset vocabulary
/// (`linux`/`darwin`, `amd64`/`arm64`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: &'static str,
    pub arch: &'static str,
}

impl Platform {
    /// Resolve the platform of the running process.
    ///
    /// # Errors
    ///
    /// [`AlError::UnsupportedPlatform`] when no release asset exists for this
    /// OS/architecture combination. Fatal, never retried.
    pub fn current() -> Result<Self, AlError> {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Resolve from explicit OS/arch strings (as named by
    /// `std::env::consts`). Pure; exposed for tests.
    pub fn from_parts(os: &str, arch: &str) -> Result<Self, AlError> {
        let unsupported = || AlError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        };
        let asset_os = match os {
            "linux" => "linux",
            "macos" => "darwin",
            _ => return Err(unsupported()),
        };
        let asset_arch = match arch {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            _ => return Err(unsupported()),
        };
        Ok(Self {
            os: asset_os,
            arch: asset_arch,
        })
    }

    /// Name of the release asset for this platform, e.g. `al-linux-amd64`.
    pub fn asset_name(&self) -> String {
        format!("al-{}-{}", self.os, self.arch)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}
