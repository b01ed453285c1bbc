//! `projsync diff` - show drift without changing anything

use anyhow::Result;
use argocd::Project;
use colored::Colorize;
use declarative::{Connector, External, FieldDiff, Record};

use super::{call_context, load_config};
use crate::Context;
use crate::cli::DiffArgs;
use crate::config::Config;
use crate::connector::ProjectConnector;
use crate::{store, ui};

pub fn run(ctx: &Context, args: &DiffArgs) -> Result<()> {
    let config = load_config(ctx)?;
    let record = store::load(&args.record)?;

    match drift(&config, &record)? {
        None => ui::warn(&format!(
            "{} does not exist on the server; reconcile would create it",
            record.name
        )),
        Some(diffs) if diffs.is_empty() => ui::success(&format!("{} is up to date", record.name)),
        Some(diffs) => {
            ui::header(&format!("{} ({} drifted)", record.name, diffs.len()));
            for diff in &diffs {
                println!("  {} {}", "~".yellow(), diff);
            }
        }
    }
    Ok(())
}

/// Drift between a record and its project; `None` if the project is missing
pub fn drift(config: &Config, record: &Record<Project>) -> Result<Option<Vec<FieldDiff>>> {
    let call = call_context(config);
    let client = ProjectConnector::new(config.clone()).connect(&call, record)?;
    Ok(External::<Project, _>::new(client).drift(&call, record)?)
}
