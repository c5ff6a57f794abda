// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fgp maint`: inspect and clean up stored files and status records.

use anyhow::Result;
use clap::{Args, Subcommand};
use fg_core::JobKey;
use fg_engine::{Maintenance, StoredData};

use crate::context::App;
use crate::exit_error::ExitError;
use crate::output::{print_json, print_status, OutputFormat};

#[derive(Args)]
pub struct MaintArgs {
    #[command(subcommand)]
    pub command: MaintCommand,
}

#[derive(Subcommand)]
pub enum MaintCommand {
    /// List stored files under a prefix
    List {
        #[arg(default_value = "")]
        prefix: String,
    },
    /// Print a stored file
    Read { path: String },
    /// Delete every stored file under a prefix
    Delete { prefix: String },
    /// Show a raw status record
    Status {
        #[arg(long)]
        job_key: String,
    },
    /// Clear a status record
    Clear {
        #[arg(long)]
        job_key: String,
        /// Also delete the job's instance descriptor and batch files
        #[arg(long)]
        instance: bool,
    },
}

pub async fn handle(app: &App, args: MaintArgs, format: OutputFormat) -> Result<()> {
    let maint = Maintenance::new(app.stores.clone());
    match args.command {
        MaintCommand::List { prefix } => {
            let paths = maint.list(&prefix)?;
            match format {
                OutputFormat::Json => print_json(&paths)?,
                OutputFormat::Text => paths.iter().for_each(|p| println!("{p}")),
            }
        }
        MaintCommand::Read { path } => match maint.read(&path)? {
            Some(StoredData::Json(value)) => print_json(&value)?,
            Some(StoredData::Text(text)) => match format {
                OutputFormat::Json => print_json(&text)?,
                OutputFormat::Text => println!("{text}"),
            },
            None => return Err(ExitError::new(1, format!("no such file: {path}")).into()),
        },
        MaintCommand::Delete { prefix } => {
            if prefix.trim_matches('/').is_empty() {
                return Err(ExitError::new(2, "refusing to delete the whole store").into());
            }
            let removed = maint.delete(&prefix)?;
            match format {
                OutputFormat::Json => print_json(&serde_json::json!({ "deleted": removed }))?,
                OutputFormat::Text => println!("Deleted {removed} files"),
            }
        }
        MaintCommand::Status { job_key } => {
            let key = JobKey::new(job_key);
            let Some(status) = maint.status(&key)? else {
                return Err(ExitError::new(1, format!("no status recorded for {key}")).into());
            };
            match format {
                OutputFormat::Json => print_json(&status)?,
                OutputFormat::Text => print_status(key.as_str(), &status, app.stores.now()),
            }
        }
        MaintCommand::Clear { job_key, instance } => {
            let key = JobKey::new(job_key);
            let cleared = maint.clear_status(&key)?;
            let removed = if instance { maint.clear_instance(&key)? } else { 0 };
            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "job_key": key,
                    "cleared": cleared,
                    "files_removed": removed,
                }))?,
                OutputFormat::Text => {
                    let what = if cleared.is_some() { "Cleared" } else { "No" };
                    println!("{what} status for {key}");
                    if instance {
                        println!("Removed {removed} instance files");
                    }
                }
            }
        }
    }
    Ok(())
}
