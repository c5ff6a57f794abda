// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fgp status`: show the status record of a job or one of its batches.

use anyhow::Result;
use clap::Args;
use fg_core::{Batch, InstanceDescriptor, JobKey};
use fg_storage::{layout, BlobStoreExt};

use crate::color;
use crate::context::App;
use crate::exit_error::ExitError;
use crate::output::{print_json, print_status, OutputFormat};

#[derive(Args)]
pub struct StatusArgs {
    #[arg(long)]
    pub job_key: String,
    /// Show this batch's record instead of the job's
    #[arg(long)]
    pub batch: Option<u32>,
}

pub async fn handle(app: &App, args: StatusArgs, format: OutputFormat) -> Result<()> {
    let job_key = JobKey::new(args.job_key);
    let key = match args.batch {
        Some(n) => job_key.batch(n),
        None => job_key.clone(),
    };
    let status = app.stores.statuses.try_read(&key)?;
    let batches: Vec<Batch> = match args.batch {
        Some(_) => Vec::new(),
        None => app
            .stores
            .blobs
            .read_json::<InstanceDescriptor>(&layout::descriptor_path(&job_key))?
            .map(|d| d.batches)
            .unwrap_or_default(),
    };
    let Some(status) = status else {
        return Err(ExitError::new(1, format!("no status recorded for {key}")).into());
    };

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "job_key": key,
            "status": status,
            "batches": batches,
        }))?,
        OutputFormat::Text => {
            print_status(key.as_str(), &status, app.stores.now());
            if !batches.is_empty() {
                println!("{}", color::header("batches"));
            }
            for batch in &batches {
                println!("  {}", batch_line(batch));
            }
        }
    }
    Ok(())
}

fn batch_line(batch: &Batch) -> String {
    let activation = batch
        .activation_id
        .as_ref()
        .map(|a| color::muted(fg_core::short(a.as_str(), 12)))
        .unwrap_or_default();
    format!(
        "{:>4}  {:<12} {:>6} items  {}",
        batch.batch_number,
        batch.state.to_string(),
        batch.item_count,
        activation
    )
    .trim_end()
    .to_string()
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
