// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fgp start`: plan a promote and trigger its first batch.

use anyhow::Result;
use clap::Args;
use fg_core::{JobParams, PromoteError};
use fg_engine::start_promote;

use crate::context::App;
use crate::exit_error::ExitError;
use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct StartArgs {
    /// Staging tree root; also the job key
    #[arg(long)]
    pub root: String,
    /// Admin page URI carrying `owner`, `repo` and `ref` query parameters
    #[arg(long)]
    pub admin_uri: String,
    /// Project document receiving the report row
    #[arg(long)]
    pub project: String,
    /// Publish items after previewing them
    #[arg(long)]
    pub publish: bool,
}

impl StartArgs {
    fn params(self) -> JobParams {
        JobParams {
            fg_root_folder: self.root,
            admin_page_uri: self.admin_uri,
            project_excel_path: self.project,
            do_publish: self.publish,
        }
    }
}

pub async fn handle(app: &App, args: StartArgs, format: OutputFormat) -> Result<()> {
    let summary =
        match start_promote(app.stores.clone(), app.launcher()?, &app.content(), &app.config, args.params())
            .await
        {
            Ok(summary) => summary,
            Err(e @ PromoteError::Validation(_)) => return Err(ExitError::new(2, e.to_string()).into()),
            Err(e) => return Err(ExitError::new(1, e.to_string()).into()),
        };

    match format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Text => {
            println!(
                "Planned {} items in {} batches for {}",
                summary.items, summary.batches, summary.job_key
            );
            if let Some(activation) = &summary.first_activation {
                println!("Triggered batch 1 ({activation})");
            }
        }
    }
    Ok(())
}
