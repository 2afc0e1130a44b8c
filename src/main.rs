//! al CLI entry point.
//!
//! Dispatch runs before argument parsing: every invocation first resolves
//! the version this directory should run (pin file, `AL_VERSION` override)
//! and, when it differs from this binary, hands the entire argv over to the
//! cached copy of that version. Only when the running binary is already the
//! right one does clap see the arguments.

use al_cli::cli::Cli;
use al_cli::core::{RealSystem, user_friendly_error};
use al_cli::dispatch::{Dispatch, Dispatcher, default_launcher};
use anyhow::{Context, Result};
use clap::Parser;
use std::ffi::OsString;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let argv: Vec<OsString> = std::env::args_os().collect();
    let cwd = std::env::current_dir().context("failed to determine the working directory")?;
    let system = RealSystem;
    let launcher = default_launcher();

    let dispatcher = Dispatcher::new(&system, launcher.as_ref());
    match dispatcher
        .dispatch(&argv, &cwd, env!("CARGO_PKG_VERSION"))
        .await
    {
        // Already the right version; fall through to the CLI.
        Ok(Dispatch::Current) => {}
        // Control went to another version (spawn-and-forward platforms);
        // on exec platforms a successful hand-off never returns here.
        Ok(Dispatch::HandedOff { code }) => std::process::exit(code),
        Err(err) => {
            user_friendly_error(err).display();
            std::process::exit(1);
        }
    }

    match Cli::parse().execute().await {
        Ok(()) => Ok(()),
        Err(err) => {
            user_friendly_error(err).display();
            std::process::exit(1);
        }
    }
}
