//! Dispatcher flows against a real filesystem with injected capabilities.

use al_cli::constants::{ENV_CACHE_DIR, ENV_NO_NETWORK};
use al_cli::dispatch::{Dispatch, Dispatcher, SpawnLauncher};
use al_cli::test_utils::FakeSystem;
use al_cli::utils::platform::Platform;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn argv() -> Vec<OsString> {
    vec![OsString::from("al")]
}

/// Path of the cache entry for `version` under `cache_root` on the host
/// platform.
fn entry_path(cache_root: &Path, version: &str) -> PathBuf {
    let platform = Platform::current().unwrap();
    cache_root
        .join("versions")
        .join(version)
        .join(platform.to_string())
        .join(platform.asset_name())
}

#[cfg(unix)]
fn seed_script(path: &Path, script: &str) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, script).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

#[tokio::test]
async fn noop_dispatch_touches_neither_network_nor_cache() {
    let cache = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    std::fs::create_dir_all(project.path().join(".al")).unwrap();

    let system = FakeSystem::new()
        .with_env(ENV_CACHE_DIR, cache.path().to_str().unwrap())
        .with_file(
            project.path().join(".al").join("al.version"),
            "# pinned to what we already run\nv0.9.0\n",
        );
    let launcher = SpawnLauncher;
    let dispatcher = Dispatcher::new(&system, &launcher);

    let outcome = dispatcher
        .dispatch(&argv(), project.path(), "0.9.0")
        .await
        .unwrap();

    assert_eq!(outcome, Dispatch::Current);
    // No lock sidecars, no entries: the no-op path must not touch the cache.
    assert_eq!(std::fs::read_dir(cache.path()).unwrap().count(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn pinned_version_hands_off_with_guard_set() {
    let cache = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    std::fs::create_dir_all(project.path().join(".al")).unwrap();

    let entry = entry_path(cache.path(), "0.6.1");
    // The stand-in binary proves both the exit-code forwarding and that the
    // guard variable reached the child environment.
    seed_script(&entry, "#!/bin/sh\ntest \"$AL_DISPATCHED\" = 1 || exit 99\nexit 42\n");

    let system = FakeSystem::new()
        .with_env(ENV_CACHE_DIR, cache.path().to_str().unwrap())
        .with_env(ENV_NO_NETWORK, "1")
        .with_file(
            project.path().join(".al").join("al.version"),
            "v0.6.1\n",
        );
    let launcher = SpawnLauncher;
    let dispatcher = Dispatcher::new(&system, &launcher);

    let outcome = dispatcher
        .dispatch(&argv(), project.path(), "0.9.0")
        .await
        .unwrap();

    assert_eq!(outcome, Dispatch::HandedOff { code: 42 });
    let statuses = system.statuses();
    assert!(
        statuses.iter().any(|line| line.contains("0.6.1") && line.contains("pin")),
        "expected a provenance line, got {statuses:?}"
    );
}

#[cfg(unix)]
#[tokio::test]
async fn hand_off_forwards_remaining_argv() {
    let cache = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    std::fs::create_dir_all(project.path().join(".al")).unwrap();

    let entry = entry_path(cache.path(), "0.6.1");
    seed_script(
        &entry,
        "#!/bin/sh\ntest \"$1\" = run && test \"$2\" = --fast && exit 0\nexit 1\n",
    );

    let system = FakeSystem::new()
        .with_env(ENV_CACHE_DIR, cache.path().to_str().unwrap())
        .with_env(ENV_NO_NETWORK, "1")
        .with_file(project.path().join(".al").join("al.version"), "0.6.1\n");
    let launcher = SpawnLauncher;
    let dispatcher = Dispatcher::new(&system, &launcher);

    let argv = vec![
        OsString::from("al"),
        OsString::from("run"),
        OsString::from("--fast"),
    ];
    let outcome = dispatcher
        .dispatch(&argv, project.path(), "0.9.0")
        .await
        .unwrap();
    assert_eq!(outcome, Dispatch::HandedOff { code: 0 });
}

#[tokio::test]
async fn uncached_pin_without_network_fails_before_hand_off() {
    let cache = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    std::fs::create_dir_all(project.path().join(".al")).unwrap();

    let system = FakeSystem::new()
        .with_env(ENV_CACHE_DIR, cache.path().to_str().unwrap())
        .with_env(ENV_NO_NETWORK, "1")
        .with_file(project.path().join(".al").join("al.version"), "0.6.1\n");
    let launcher = SpawnLauncher;
    let dispatcher = Dispatcher::new(&system, &launcher);

    let err = dispatcher
        .dispatch(&argv(), project.path(), "0.9.0")
        .await
        .unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("not cached"), "message was: {message}");
}

#[cfg(unix)]
#[tokio::test]
async fn concurrent_dispatches_agree_on_the_cached_entry() {
    use std::sync::Arc;

    let cache = TempDir::new().unwrap();
    let entry = entry_path(cache.path(), "0.6.1");
    seed_script(&entry, "#!/bin/sh\nexit 0\n");

    let system = Arc::new(
        FakeSystem::new()
            .with_env(ENV_CACHE_DIR, cache.path().to_str().unwrap())
            .with_env(ENV_NO_NETWORK, "1"),
    );

    let mut handles = Vec::new();
    for _ in 0..8 {
        let system = Arc::clone(&system);
        let root = cache.path().to_path_buf();
        handles.push(tokio::spawn(async move {
            let platform = Platform::current().unwrap();
            let cache = al_cli::cache::BinaryCache::new(root, platform, system.as_ref()).unwrap();
            cache.ensure_version("0.6.1").await.unwrap()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), entry);
    }
}
