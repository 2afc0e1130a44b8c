//! Command-line interface for al.
//!
//! The CLI is intentionally small: dispatch itself runs before argument
//! parsing (see `main.rs`) so that argv forwards verbatim to whatever version
//! a project pins - including subcommands this binary does not know about.
//! What remains here are the commands for inspecting and managing the
//! dispatch machinery itself.

use crate::cache::BinaryCache;
use crate::core::{RealSystem, System};
use crate::utils::fs::{find_project_root, resolve_cache_root};
use crate::utils::platform::Platform;
use crate::version::{normalize_version, resolve_version};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

/// Main CLI application structure for al.
#[derive(Parser)]
#[command(
    name = "al",
    about = "agent launcher with transparent per-project version dispatch",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the version of the running binary
    Version,
    /// Resolve and print the version this directory dispatches to
    Which,
    /// Download and verify a version into the cache without running it
    Fetch {
        /// Version to fetch, e.g. `0.6.1` or `v0.6.1`
        version: String,
    },
    /// Inspect or clean the binary cache
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Subcommand)]
enum CacheCommand {
    /// Print the resolved cache root directory
    Dir,
    /// Remove all cached versions
    Clean,
}

impl Cli {
    /// Execute the parsed command.
    pub async fn execute(self) -> Result<()> {
        let system = RealSystem;
        match self.command {
            Commands::Version => {
                println!("al {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
            Commands::Which => which(&system),
            Commands::Fetch { version } => fetch(&system, &version).await,
            Commands::Cache(CacheCommand::Dir) => {
                println!("{}", resolve_cache_root(&system)?.display());
                Ok(())
            }
            Commands::Cache(CacheCommand::Clean) => clean_cache(&system),
        }
    }
}

fn which(system: &dyn System) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to determine the working directory")?;
    let current = normalize_version(env!("CARGO_PKG_VERSION"))?;
    let project_root = find_project_root(&cwd);
    let resolved = resolve_version(&current, project_root.as_deref(), system)?;
    if let Some(warning) = &resolved.pin_warning {
        system.warn(warning);
    }
    println!("{} ({})", resolved.version, resolved.source);
    Ok(())
}

async fn fetch(system: &dyn System, version: &str) -> Result<()> {
    let version = normalize_version(version)?;
    let platform = Platform::current()?;
    let cache = BinaryCache::new(resolve_cache_root(system)?, platform, system)?;
    let path = cache.ensure_version(&version).await?;
    println!("{}", path.display());
    Ok(())
}

fn clean_cache(system: &dyn System) -> Result<()> {
    let versions = resolve_cache_root(system)?.join("versions");
    if versions.exists() {
        std::fs::remove_dir_all(&versions)
            .with_context(|| format!("failed to remove {}", versions.display()))?;
        println!("removed {}", versions.display());
    } else {
        println!("nothing to clean");
    }
    Ok(())
}
