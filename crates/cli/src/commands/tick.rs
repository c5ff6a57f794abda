// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fgp tick`: advance a promote by one reconciliation step.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use fg_core::JobKey;
use fg_engine::TickOutcome;

use crate::context::App;
use crate::exit_error::ExitError;
use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct TickArgs {
    /// Job key (the staging root given to `start`)
    #[arg(long)]
    pub job_key: String,
    /// Keep ticking every SECS seconds until the job completes
    #[arg(long, value_name = "SECS")]
    pub every: Option<u64>,
}

pub async fn handle(app: &App, args: TickArgs, format: OutputFormat) -> Result<()> {
    let key = JobKey::new(args.job_key);
    let reconciler = app.reconciler(&key)?;
    loop {
        let outcome = reconciler.tick().await;
        match format {
            OutputFormat::Text => println!("{outcome}"),
            OutputFormat::Json => print_json(&serde_json::json!({
                "job_key": key,
                "outcome": outcome.to_string(),
            }))?,
        }

        match (&outcome, args.every) {
            (TickOutcome::Completed(state), _) => {
                return match ExitError::for_outcome(*state) {
                    Some(e) => Err(e.into()),
                    None => Ok(()),
                };
            }
            (TickOutcome::Errored(message), None) => {
                return Err(ExitError::new(1, message.clone()).into());
            }
            (_, None) => return Ok(()),
            (_, Some(secs)) => tokio::time::sleep(Duration::from_secs(secs)).await,
        }
    }
}
