// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fgp copy` / `fgp delete`: create or remove the staging tree.

use anyhow::Result;
use clap::Args;
use fg_core::{JobParams, PromoteError};
use fg_engine::{start_tree_job, TreeJob};

use crate::context::App;
use crate::exit_error::ExitError;
use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct TreeArgs {
    /// Staging tree root
    #[arg(long)]
    pub root: String,
    /// Admin page URI carrying `owner`, `repo` and `ref` query parameters
    #[arg(long)]
    pub admin_uri: String,
    /// Project document receiving the report row
    #[arg(long)]
    pub project: String,
}

impl TreeArgs {
    fn params(self) -> JobParams {
        JobParams {
            fg_root_folder: self.root,
            admin_page_uri: self.admin_uri,
            project_excel_path: self.project,
            do_publish: false,
        }
    }
}

pub async fn handle(app: &App, job: TreeJob, args: TreeArgs, format: OutputFormat) -> Result<()> {
    let launcher = app.launcher()?;
    let started =
        match start_tree_job(&app.stores, &launcher, &app.config, job, args.params()).await {
            Ok(started) => started,
            Err(e @ PromoteError::Validation(_)) => {
                return Err(ExitError::new(2, e.to_string()).into())
            }
            Err(e) => return Err(ExitError::new(1, e.to_string()).into()),
        };

    match format {
        OutputFormat::Json => print_json(&started)?,
        OutputFormat::Text => {
            println!("Triggered {job} for {} ({})", started.job_key, started.activation_id);
        }
    }
    Ok(())
}
