//! `projsync delete` - request deletion and run a pass

use anyhow::Result;
use argocd::Project;
use declarative::{DeletionPolicy, Outcome, Record, reconcile};
use std::path::Path;

use super::{call_context, load_config};
use crate::Context;
use crate::cli::DeleteArgs;
use crate::config::Config;
use crate::connector::ProjectConnector;
use crate::{store, ui};

pub fn run(ctx: &Context, args: &DeleteArgs) -> Result<()> {
    let config = load_config(ctx)?;
    let mut record = store::load(&args.record)?;

    let target = record.external_name().unwrap_or(&record.name).to_string();
    let prompt = match record.deletion_policy {
        DeletionPolicy::Delete => format!("Delete project {target}?"),
        DeletionPolicy::Orphan => format!("Release project {target} (it stays on the server)?"),
    };
    if !args.yes && !confirm(&prompt)? {
        ui::warn("Aborted");
        return Ok(());
    }

    let outcome = delete_record(&config, &args.record, &mut record, args.purge)?;
    ui::success(&format!("{}: {}", record.name, outcome));
    if args.purge && outcome.is_finalized() {
        ui::dim(&format!("removed {}", args.record.display()));
    }
    Ok(())
}

/// Mark the record for deletion, run a pass, then save or purge it
///
/// The record file is removed only with `purge` and only once the deletion
/// has completed; otherwise it is saved so the outcome is kept.
pub fn delete_record(
    config: &Config,
    path: &Path,
    record: &mut Record<Project>,
    purge: bool,
) -> Result<Outcome> {
    record.deletion_requested = true;

    let connector = ProjectConnector::new(config.clone());
    let result = reconcile(&call_context(config), &connector, record, false);

    if purge && result.as_ref().is_ok_and(|outcome| outcome.is_finalized()) {
        store::remove(path)?;
    } else {
        store::save(path, record)?;
    }
    Ok(result?)
}

/// Confirm with user
fn confirm(prompt: &str) -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;

    Ok(confirmed)
}
