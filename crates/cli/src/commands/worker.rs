// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fgp worker`: execute one batch, or a whole copy or delete. Launched by
//! the tracker, not by hand.

use anyhow::{Context, Result};
use clap::Args;
use fg_core::{ActivationId, JobKey, JobParams, JobState, PromoteError};
use fg_engine::TreeJob;

use crate::context::App;
use crate::env;
use crate::exit_error::ExitError;
use crate::logging;

#[derive(Args)]
pub struct WorkerArgs {
    /// Worker kind: the promote worker name, `copy-worker` or `delete-worker`
    #[arg(long, default_value = "promote-worker")]
    pub action: String,
    #[arg(long)]
    pub job_key: String,
    /// Batch number, starting at 1 (0 for copy and delete)
    #[arg(long)]
    pub batch: u32,
    /// Job parameters as JSON
    #[arg(long)]
    pub params: String,
}

pub async fn handle(app: &App, args: WorkerArgs) -> Result<()> {
    let key = JobKey::new(args.job_key);
    let _guard = logging::init_worker(&app.state_dir, &key, args.batch)?;
    let params: JobParams = serde_json::from_str(&args.params).context("invalid --params JSON")?;
    let activation = env::activation_id().map(ActivationId::from_string);

    tracing::info!(job_key = %key, action = %args.action, batch = args.batch, activation_id = ?activation, "worker starting");
    let result: Result<JobState, PromoteError> = match TreeJob::from_worker_action(&args.action) {
        Some(job) => app.tree_worker(&key, job).run(&params).await.map(|outcome| outcome.state),
        None => app.worker(&key).run(args.batch, &params).await,
    };

    // The tracker treats a missing handle as a finished worker.
    if let Some(activation) = &activation {
        if let Err(e) = app.launcher()?.remove_handle(activation) {
            tracing::warn!(activation_id = %activation, error = %e, "failed to remove worker handle");
        }
    }

    match result {
        Ok(state) => {
            tracing::info!(job_key = %key, batch = args.batch, %state, "worker finished");
            Ok(())
        }
        Err(e) => {
            tracing::error!(job_key = %key, batch = args.batch, error = %e, "worker failed");
            Err(ExitError::new(1, e.to_string()).into())
        }
    }
}
