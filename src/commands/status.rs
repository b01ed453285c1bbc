//! `projsync status` - stored record state, no remote calls

use anyhow::Result;
use argocd::Project;
use declarative::{DeletionPolicy, Record};

use crate::Context;
use crate::cli::StatusArgs;
use crate::{store, ui};

pub fn run(ctx: &Context, args: &StatusArgs) -> Result<()> {
    for path in &args.records {
        let record = store::load(path)?;

        ui::header(&record.name);
        for (key, value) in summary(&record) {
            ui::kv(key, &value);
        }
        if record.status.conditions.is_empty() {
            ui::dim("no conditions yet");
        }
        for condition in &record.status.conditions {
            println!("  {}", ui::condition_line(condition));
        }
        if ctx.verbose > 0 {
            ui::dim(&path.display().to_string());
        }
    }
    Ok(())
}

/// Key facts about a record, in display order
fn summary(record: &Record<Project>) -> Vec<(&'static str, String)> {
    let mut lines = vec![
        ("kind", record.kind.clone()),
        (
            "project",
            record.external_name().unwrap_or("<not created>").to_string(),
        ),
        (
            "provider",
            record
                .provider_config
                .clone()
                .unwrap_or_else(|| "<default>".to_string()),
        ),
    ];

    let observed = &record.status.at_provider;
    if !observed.resource_version.is_empty() {
        lines.push(("version", observed.resource_version.clone()));
        lines.push(("generation", observed.generation.to_string()));
    }
    if let Some(created) = observed.creation_timestamp {
        lines.push(("created", created.to_rfc3339()));
    }
    if record.deletion_requested {
        let policy = match record.deletion_policy {
            DeletionPolicy::Delete => "delete",
            DeletionPolicy::Orphan => "orphan",
        };
        lines.push(("deletion", format!("requested ({policy})")));
    }
    lines
}
