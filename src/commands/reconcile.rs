//! `projsync reconcile` - one pass per record, in parallel

use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{ExecuteOptions, ExecuteSummary, Execution, ProgressCallback, execute};
use std::path::PathBuf;

use super::load_config;
use crate::Context;
use crate::cli::ReconcileArgs;
use crate::config::Config;
use crate::connector::ProjectConnector;
use crate::progress::BarProgress;
use crate::{store, ui};

pub fn run(ctx: &Context, args: &ReconcileArgs) -> Result<()> {
    let config = load_config(ctx)?;
    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        jobs: args.jobs.unwrap_or(config.defaults.jobs).max(1),
        pass_timeout: config.timeout(),
    };

    let mut progress = BarProgress::new(ctx.quiet);
    let execution = reconcile_files(&config, &args.records, &opts, &mut progress)?;

    print_reports(ctx, &execution);
    print_summary(&execution.summary, opts.dry_run);

    if !execution.summary.is_success() {
        bail!(
            "{} of {} passes failed",
            execution.summary.failed,
            execution.summary.total()
        );
    }
    Ok(())
}

/// Run a pass for every record file and save the records back
///
/// Every record is saved, failed ones included, so conditions and any
/// binding made before the failure survive. Dry runs save nothing.
pub fn reconcile_files<P: ProgressCallback>(
    config: &Config,
    paths: &[PathBuf],
    opts: &ExecuteOptions,
    progress: &mut P,
) -> Result<Execution> {
    let mut records = store::load_all(paths)?;
    let connector = ProjectConnector::new(config.clone());
    // Each pass gets its own deadline from `opts`
    let execution = execute(
        &declarative::Context::background(),
        &connector,
        &mut records,
        opts,
        progress,
    )?;

    if !opts.dry_run {
        let mut unsaved = 0;
        for (path, record) in paths.iter().zip(&records) {
            if let Err(e) = store::save(path, record) {
                ui::error(&format!("{e:#}"));
                unsaved += 1;
            }
        }
        if unsaved > 0 {
            bail!("{unsaved} record files could not be saved");
        }
    }

    Ok(execution)
}

fn print_reports(ctx: &Context, execution: &Execution) {
    for report in &execution.reports {
        match &report.result {
            Ok(outcome) if outcome.is_change() || outcome.is_finalized() || ctx.verbose > 0 => {
                println!("  {} {}: {}", ui::outcome_symbol(outcome), report.name, outcome);
            }
            Ok(declarative::Outcome::Planned(action)) => {
                println!("  {} {}: would {}", "→".cyan(), report.name, action);
            }
            Ok(_) => {}
            Err(e) => ui::error(&format!("{}: {}", report.name, e)),
        }
    }
}

fn print_summary(summary: &ExecuteSummary, dry_run: bool) {
    println!();
    if dry_run {
        println!("  {} Dry run - no changes made", "ℹ".blue());
    } else if summary.is_success() {
        println!("  {} Projects reconciled successfully!", "✓".green().bold());
    } else {
        println!("  {} Projects reconciled with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} projects created", summary.created);
    }
    if summary.updated > 0 {
        println!("    • {} projects updated", summary.updated);
    }
    if summary.deleted > 0 {
        println!("    • {} projects deleted", summary.deleted);
    }
    if summary.orphaned > 0 {
        println!("    • {} projects orphaned", summary.orphaned);
    }
    if summary.up_to_date > 0 {
        println!("    • {} projects up to date", summary.up_to_date);
    }
    if summary.planned > 0 {
        println!("    • {} projects planned", summary.planned);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "projects".red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{config_for, write_record};
    use declarative::{ConditionType, NoProgress, Reason};
    use std::fs;

    #[test]
    fn test_reconcile_creates_and_persists_binding() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let paths = vec![
            write_record(dir.path(), "team-a", "apps"),
            write_record(dir.path(), "team-b", "data"),
        ];

        let execution =
            reconcile_files(&config, &paths, &ExecuteOptions::default(), &mut NoProgress).unwrap();
        assert_eq!(execution.summary.created, 2);

        for path in &paths {
            let record = store::load(path).unwrap();
            assert!(record.is_bound());
            assert_eq!(
                record.condition(ConditionType::Synced).unwrap().reason,
                Reason::ReconcileSuccess
            );
        }

        // Second run converges
        let execution =
            reconcile_files(&config, &paths, &ExecuteOptions::default(), &mut NoProgress).unwrap();
        assert_eq!(execution.summary.up_to_date, 2);
        assert_eq!(execution.summary.total_changes(), 0);
    }

    #[test]
    fn test_reconcile_updates_drifted_project() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let paths = vec![write_record(dir.path(), "team-a", "apps")];
        let opts = ExecuteOptions::default();
        reconcile_files(&config, &paths, &opts, &mut NoProgress).unwrap();

        let mut record = store::load(&paths[0]).unwrap();
        record.spec.description = Some("platform".into());
        store::save(&paths[0], &record).unwrap();

        let execution = reconcile_files(&config, &paths, &opts, &mut NoProgress).unwrap();
        assert_eq!(execution.summary.updated, 1);
    }

    #[test]
    fn test_dry_run_saves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let path = write_record(dir.path(), "team-a", "apps");
        let before = fs::read_to_string(&path).unwrap();
        let opts = ExecuteOptions {
            dry_run: true,
            jobs: 1,
            ..Default::default()
        };

        let execution =
            reconcile_files(&config, &[path.clone()], &opts, &mut NoProgress).unwrap();
        assert_eq!(execution.summary.planned, 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_failed_pass_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let path = write_record(dir.path(), "team-a", "apps");
        let mut record = store::load(&path).unwrap();
        record.provider_config = Some("missing".into());
        store::save(&path, &record).unwrap();

        let execution = reconcile_files(
            &config,
            &[path.clone()],
            &ExecuteOptions::default(),
            &mut NoProgress,
        )
        .unwrap();
        assert_eq!(execution.summary.failed, 1);

        let record = store::load(&path).unwrap();
        assert_eq!(
            record.condition(ConditionType::Synced).unwrap().reason,
            Reason::ReconcileError
        );
    }

    #[test]
    fn test_bad_record_file_fails_before_any_pass() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let good = write_record(dir.path(), "team-a", "apps");
        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "kind = ").unwrap();

        assert!(
            reconcile_files(
                &config,
                &[good.clone(), bad],
                &ExecuteOptions::default(),
                &mut NoProgress
            )
            .is_err()
        );
        assert!(!store::load(&good).unwrap().is_bound());
    }
}
