// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fgp: floodgate promote CLI
//!
//! `start` plans a promote and triggers batch 1, `tick` advances it one
//! step at a time (or on an interval), and `worker` executes one batch in
//! a process launched by the tracker. `copy` and `delete` create and remove
//! the staging tree.

mod color;
mod commands;
mod context;
mod env;
mod exit_error;
mod logging;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fg_engine::TreeJob;

use commands::{maint, start, status, tick, tree, worker};
use context::App;
use exit_error::ExitError;
use output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "fgp",
    version,
    about = "Floodgate promote: copy a staging tree to production in batches",
    styles = color::styles(),
)]
struct Cli {
    /// Config file (TOML); falls back to FG_CONFIG, then defaults
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a promote and trigger its first batch
    Start(start::StartArgs),
    /// Advance a promote: track the running batch, trigger the next, finalize
    Tick(tick::TickArgs),
    /// Execute one batch (launched by the tracker)
    Worker(worker::WorkerArgs),
    /// Copy production documents into the staging tree
    Copy(tree::TreeArgs),
    /// Delete the staging tree
    Delete(tree::TreeArgs),
    /// Show job or batch status
    Status(status::StatusArgs),
    /// Inspect and clean up stored state
    Maint(maint::MaintArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if !matches!(cli.command, Commands::Worker(_)) {
        logging::init_stderr();
    }

    if let Err(e) = run(cli).await {
        let code = match e.downcast_ref::<ExitError>() {
            Some(exit) => exit.code,
            None => 1,
        };
        eprintln!("fgp: {e:#}");
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let app = App::load(cli.config.as_deref())?;
    let format = cli.output;
    match cli.command {
        Commands::Start(args) => start::handle(&app, args, format).await,
        Commands::Tick(args) => tick::handle(&app, args, format).await,
        Commands::Worker(args) => worker::handle(&app, args).await,
        Commands::Copy(args) => tree::handle(&app, TreeJob::Copy, args, format).await,
        Commands::Delete(args) => tree::handle(&app, TreeJob::Delete, args, format).await,
        Commands::Status(args) => status::handle(&app, args, format).await,
        Commands::Maint(args) => maint::handle(&app, args, format).await,
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
