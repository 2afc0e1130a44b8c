//! CLI-level tests running the installed `al` binary.

use al_cli::utils::platform::Platform;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// A command with the dispatch-relevant environment scrubbed, so tests are
/// hermetic regardless of the invoking shell.
fn al() -> Command {
    let mut cmd = Command::cargo_bin("al").unwrap();
    cmd.env_remove("AL_VERSION")
        .env_remove("AL_DISPATCHED")
        .env_remove("AL_CACHE_DIR")
        .env_remove("AL_MAX_DOWNLOAD_BYTES")
        .env("AL_NO_NETWORK", "1");
    cmd
}

#[test]
fn version_prints_build_version() {
    let workdir = TempDir::new().unwrap();
    al().current_dir(workdir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn which_without_pin_reports_current() {
    let workdir = TempDir::new().unwrap();
    al().current_dir(workdir.path())
        .arg("which")
        .assert()
        .success()
        .stdout(predicate::str::contains("(current)"));
}

#[test]
fn cache_dir_honors_override() {
    let workdir = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    al().current_dir(workdir.path())
        .env("AL_CACHE_DIR", cache.path())
        .args(["cache", "dir"])
        .assert()
        .success()
        .stdout(predicate::str::contains(cache.path().to_str().unwrap()));
}

#[test]
fn fetch_rejects_malformed_version() {
    let workdir = TempDir::new().unwrap();
    al().current_dir(workdir.path())
        .args(["fetch", "latest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid version"));
}

#[test]
fn fetch_miss_without_network_is_a_hard_error() {
    let workdir = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    al().current_dir(workdir.path())
        .env("AL_CACHE_DIR", cache.path())
        .args(["fetch", "9.9.9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AL_NO_NETWORK"));
}

#[cfg(unix)]
fn seed_entry(cache_root: &Path, version: &str, script: &str) {
    use std::os::unix::fs::PermissionsExt;
    let platform = Platform::current().unwrap();
    let entry = cache_root
        .join("versions")
        .join(version)
        .join(platform.to_string())
        .join(platform.asset_name());
    std::fs::create_dir_all(entry.parent().unwrap()).unwrap();
    std::fs::write(&entry, script).unwrap();
    std::fs::set_permissions(&entry, std::fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(unix)]
#[test]
fn pinned_project_dispatches_to_cached_version() {
    let project = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    std::fs::create_dir_all(project.path().join(".al")).unwrap();
    std::fs::write(project.path().join(".al").join("al.version"), "v0.6.1\n").unwrap();
    seed_entry(cache.path(), "0.6.1", "#!/bin/sh\necho dispatched-ok\nexit 3\n");

    al().current_dir(project.path())
        .env("AL_CACHE_DIR", cache.path())
        .arg("version")
        .assert()
        .code(3)
        .stdout(predicate::str::contains("dispatched-ok"))
        .stderr(predicate::str::contains("0.6.1"));
}

#[cfg(unix)]
#[test]
fn dispatched_child_refuses_a_second_hand_off() {
    let project = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    std::fs::create_dir_all(project.path().join(".al")).unwrap();
    std::fs::write(project.path().join(".al").join("al.version"), "0.6.1\n").unwrap();

    al().current_dir(project.path())
        .env("AL_CACHE_DIR", cache.path())
        .env("AL_DISPATCHED", "1")
        .arg("version")
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to dispatch"));
}

#[test]
fn broken_pin_warns_and_falls_back() {
    let project = TempDir::new().unwrap();
    std::fs::create_dir_all(project.path().join(".al")).unwrap();
    std::fs::write(
        project.path().join(".al").join("al.version"),
        "0.1.0\n0.2.0\n",
    )
    .unwrap();

    al().current_dir(project.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")))
        .stderr(predicate::str::contains("multiple version lines"));
}
