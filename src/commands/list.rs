//! `projsync list` - projects on the server

use anyhow::Result;
use argocd::AppProject;
use colored::Colorize;

use super::{call_context, load_config};
use crate::Context;
use crate::cli::ListArgs;
use crate::config::Config;
use crate::{connector, ui};

pub fn run(ctx: &Context, args: &ListArgs) -> Result<()> {
    let config = load_config(ctx)?;
    let projects = list_projects(&config, args.provider_config.as_deref())?;

    if projects.is_empty() {
        ui::info("No projects on the server.");
        return Ok(());
    }

    ui::header(&format!("Projects ({})", projects.len()));
    for project in &projects {
        let description = if project.spec.description.is_empty() {
            String::new()
        } else {
            format!(" - {}", project.spec.description)
        };
        println!(
            "  {}{} {}",
            project.metadata.name.bold(),
            description,
            format!("(generation {})", project.metadata.generation).dimmed()
        );
        if ctx.verbose > 0 {
            for repo in &project.spec.source_repos {
                ui::dim(repo);
            }
        }
    }
    Ok(())
}

/// Every project on the named (or default) provider, sorted by name
pub fn list_projects(config: &Config, provider: Option<&str>) -> Result<Vec<AppProject>> {
    let service = connector::service(config, provider)?;
    Ok(service.list(&call_context(config))?)
}
