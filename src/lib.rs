//! al - agent launcher with transparent per-project version dispatch.
//!
//! On every invocation, al decides whether the currently running binary is
//! the version that should actually execute. Projects pin a version in
//! `.al/al.version`; `AL_VERSION` overrides the pin; otherwise the running
//! binary is already the right one. When another version is required, al
//! downloads it from the release host, verifies it against the published
//! checksum manifest, installs it into a per-user cache with an atomic
//! rename, and hands control to it - on POSIX by replacing the process image
//! in place.
//!
//! # Architecture
//!
//! - [`dispatch`] - the orchestrating state machine and process hand-off
//! - [`version`] - normalization, the project pin file, resolution precedence
//! - [`cache`] - the versioned binary cache, its advisory lock, and the
//!   download/checksum pipeline
//! - [`utils`] - platform resolution and filesystem conventions
//! - [`core`] - the error taxonomy and the [`core::System`] capability
//!   boundary
//! - [`cli`] - the clap command surface (`version`, `which`, `fetch`,
//!   `cache`)
//!
//! # Correctness properties
//!
//! The cache tolerates concurrent invocations from independent processes
//! (e.g. parallel build agents): fills of one entry are serialized by a
//! cross-process advisory lock, entries appear only via atomic rename of a
//! fully verified temp file, and a dispatched child is marked with a guard
//! variable so a hand-off can never recurse.

pub mod cache;
pub mod cli;
pub mod constants;
pub mod core;
pub mod dispatch;
pub mod utils;
pub mod version;

// Available to both unit tests and the integration suite.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
