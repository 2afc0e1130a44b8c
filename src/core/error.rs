//! Error handling for al.
//!
//! The error system has two layers:
//! 1. [`AlError`] - strongly-typed errors for every failure class in the
//!    dispatch core, so callers can match on the failure mode
//! 2. [`ErrorContext`] - a display wrapper that adds an actionable suggestion
//!    when one exists, used by `main` to render errors for CLI users
//!
//! Propagation policy: pin-file problems are soft (they become warnings, see
//! [`crate::version::pin`]); every other class aborts the current operation
//! and is printed by the caller before exiting non-zero. Transient network
//! failures are retried exactly once before becoming fatal; the
//! [`AlError::is_transient`] predicate is what the retry loop consults.

use crate::constants::{ENV_DISPATCH_GUARD, ENV_NO_NETWORK, ENV_VERSION};
use colored::Colorize;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for al dispatch operations.
///
/// Each variant maps to one class of the failure taxonomy: configuration,
/// network (transient vs. permanent), integrity, concurrency, guard, and
/// no-network cache misses. Plain I/O failures are wrapped with their path
/// via `anyhow::Context` at the call site instead of getting variants here.
#[derive(Error, Debug)]
pub enum AlError {
    /// The running OS/CPU combination has no published release asset.
    #[error("unsupported platform: {os}/{arch} (al ships binaries for linux and macos on x86_64 and aarch64)")]
    UnsupportedPlatform { os: String, arch: String },

    /// A user-supplied version string failed normalization.
    #[error("invalid version {input:?}: {reason}")]
    InvalidVersion { input: String, reason: String },

    /// The version compiled into this binary failed normalization. This is a
    /// packaging bug, not a user error.
    #[error("this build reports an invalid version {version:?}: {reason}")]
    InvalidBuildVersion { version: String, reason: String },

    /// The release host answered 404 for the requested version. Never
    /// retried.
    #[error("version {version} was not found on the release host; it may not have been published")]
    VersionNotFound { version: String },

    /// A network-level failure (connect, timeout, interrupted transfer).
    /// Retried once.
    #[error("network error during {operation}")]
    Network {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The release host answered 5xx. Retried once.
    #[error("server error during {operation}: HTTP {status}")]
    ServerError { operation: &'static str, status: u16 },

    /// Any other unexpected HTTP status. Never retried.
    #[error("request failed during {operation}: HTTP {status}")]
    HttpStatus { operation: &'static str, status: u16 },

    /// A response body exceeded the configured byte ceiling.
    #[error("download exceeds the {limit}-byte ceiling; aborting")]
    DownloadTooLarge { limit: u64 },

    /// The downloaded asset does not match the published checksum. Nothing
    /// is installed.
    #[error("checksum mismatch for {asset}\n  expected: {expected}\n  actual:   {actual}")]
    ChecksumMismatch {
        asset: String,
        expected: String,
        actual: String,
    },

    /// The checksum manifest has no line for the expected asset.
    #[error("checksum for {asset} not found in {manifest}")]
    ChecksumNotFound { asset: String, manifest: String },

    /// The per-entry cache lock could not be acquired within the wait budget.
    #[error("timed out after {waited_secs}s waiting for lock {path}")]
    LockTimeout { path: PathBuf, waited_secs: u64 },

    /// This process was itself reached via a hand-off and tried to hand off
    /// again; a second hand-off would loop or indicates a packaging bug.
    #[error("refusing to dispatch: AL_DISPATCHED is already set, so this process was already handed off once")]
    RecursiveDispatch,

    /// The resolved version is the `dev` sentinel, for which no artifact is
    /// ever published.
    #[error("cannot dispatch to a dev build: no published artifact exists for \"dev\"")]
    DevDispatch,

    /// Cache miss while downloads are forbidden.
    #[error("version {version} is not cached at {path} and AL_NO_NETWORK is set")]
    NotCached { version: String, path: PathBuf },

    /// Dispatch was invoked with an empty argument vector.
    #[error("dispatch requires a non-empty argument vector")]
    MissingArgv,

    /// Dispatch was invoked with an empty working directory.
    #[error("dispatch requires a non-empty working directory")]
    MissingWorkDir,
}

impl AlError {
    /// Whether the retry loop may attempt this operation once more.
    ///
    /// Only network-level failures and 5xx responses qualify; 404 and other
    /// 4xx statuses are answers, not outages.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::ServerError { .. })
    }

    /// An actionable hint for the user, when one exists.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::VersionNotFound { .. } => Some(format!(
                "check the pinned version in .al/al.version, or unset {ENV_VERSION} if it is exported"
            )),
            Self::NotCached { version, .. } => Some(format!(
                "pre-fetch it with `al fetch {version}` on a networked machine, or unset {ENV_NO_NETWORK}"
            )),
            Self::LockTimeout { path, .. } => Some(format!(
                "another al process may be downloading the same version; if none is running, remove {}",
                path.display()
            )),
            Self::RecursiveDispatch => Some(format!(
                "unset {ENV_DISPATCH_GUARD} if it leaked into your shell environment"
            )),
            Self::Network { .. } | Self::ServerError { .. } => {
                Some("check your network connection and retry".to_string())
            }
            _ => None,
        }
    }
}

/// A user-facing rendering of an error: the message chain plus an optional
/// suggestion line.
pub struct ErrorContext {
    error: anyhow::Error,
    suggestion: Option<String>,
}

impl ErrorContext {
    pub fn new(error: anyhow::Error) -> Self {
        Self {
            error,
            suggestion: None,
        }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Print the error (and suggestion, if any) to stderr.
    pub fn display(&self) {
        eprintln!("{} {:#}", "error:".red().bold(), self.error);
        if let Some(suggestion) = &self.suggestion {
            eprintln!("{} {}", "hint:".yellow().bold(), suggestion);
        }
    }
}

/// Wrap any error for CLI display, attaching a suggestion when the underlying
/// [`AlError`] has one.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let suggestion = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<AlError>())
        .and_then(AlError::suggestion);
    match suggestion {
        Some(suggestion) => ErrorContext::new(error).with_suggestion(suggestion),
        None => ErrorContext::new(error),
    }
}
