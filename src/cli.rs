use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "projsync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Keep Argo CD projects converged to declared records", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/projsync/config.toml)
    #[arg(long, global = true, env = "PROJSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one reconciliation pass per record
    Reconcile(ReconcileArgs),

    /// Show how a project differs from its record
    Diff(DiffArgs),

    /// Show the stored state of records (no remote calls)
    Status(StatusArgs),

    /// Delete the project behind a record
    Delete(DeleteArgs),

    /// List projects on the server
    List(ListArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct ReconcileArgs {
    /// Record files
    #[arg(required = true)]
    pub records: Vec<PathBuf>,

    /// Number of passes to run in parallel (default from config)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Observe and plan only; nothing is changed or saved
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct DiffArgs {
    /// Record file
    pub record: PathBuf,
}

#[derive(Parser)]
pub struct StatusArgs {
    /// Record files
    #[arg(required = true)]
    pub records: Vec<PathBuf>,
}

#[derive(Parser)]
pub struct DeleteArgs {
    /// Record file
    pub record: PathBuf,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Remove the record file once the project is gone
    #[arg(long)]
    pub purge: bool,
}

#[derive(Parser)]
pub struct ListArgs {
    /// Provider config to query (default from config)
    #[arg(short, long)]
    pub provider_config: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_reconcile() {
        let cli = Cli::try_parse_from([
            "projsync", "-vv", "reconcile", "a.toml", "b.toml", "--jobs", "2", "-n",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Reconcile(args) => {
                assert_eq!(args.records.len(), 2);
                assert_eq!(args.jobs, Some(2));
                assert!(args.dry_run);
            }
            _ => panic!("expected reconcile"),
        }
    }

    #[test]
    fn test_reconcile_requires_records() {
        assert!(Cli::try_parse_from(["projsync", "reconcile"]).is_err());
    }

    #[test]
    fn test_parse_delete() {
        let cli = Cli::try_parse_from([
            "projsync", "--config", "c.toml", "delete", "a.toml", "--yes", "--purge",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
        match cli.command {
            Command::Delete(args) => assert!(args.yes && args.purge),
            _ => panic!("expected delete"),
        }
    }
}
