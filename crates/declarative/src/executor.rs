//! Execution engine - runs reconciliation passes for many records
//!
//! Passes for different records share nothing but the connector and the
//! cancellation context, so they run in parallel on a rayon pool. Each pass
//! still processes its own record sequentially.

use crate::context::Context;
use crate::error::Error;
use crate::reconciler::{Outcome, reconcile};
use crate::record::Record;
use crate::resource::{Connector, ResourceKind};
use crate::types::{ExecuteOptions, ExecuteSummary, PassReport};
use anyhow::Result;
use rayon::prelude::*;

/// Progress callback for batch execution
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback: Send {
    /// Called before the first pass
    fn on_batch_start(&mut self, count: usize);

    /// Called when a pass starts (sequential execution only)
    fn on_record_start(&mut self, name: &str);

    /// Called when a pass completes
    fn on_record_complete(&mut self, name: &str, result: &Result<Outcome, Error>);

    /// Called after the last pass
    fn on_batch_complete(&mut self);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_batch_start(&mut self, _count: usize) {}
    fn on_record_start(&mut self, _name: &str) {}
    fn on_record_complete(&mut self, _name: &str, _result: &Result<Outcome, Error>) {}
    fn on_batch_complete(&mut self) {}
}

/// Result of a batch
#[derive(Debug, Default)]
pub struct Execution {
    /// One report per record, in input order
    pub reports: Vec<PassReport>,
    pub summary: ExecuteSummary,
}

/// Run one pass for every record
///
/// # Arguments
/// * `ctx` - Cancellation context forwarded to every client call
/// * `connector` - Supplies a client per pass
/// * `records` - Records to reconcile; mutated in place
/// * `opts` - Execution options (dry_run, jobs)
/// * `progress` - Progress callback
///
/// # Returns
/// Per-record reports and a summary. Failed passes are reported, not
/// returned as an error; only failing to start the pool is.
pub fn execute<K, C, P>(
    ctx: &Context,
    connector: &C,
    records: &mut [Record<K>],
    opts: &ExecuteOptions,
    progress: &mut P,
) -> Result<Execution>
where
    K: ResourceKind,
    C: Connector<K>,
    P: ProgressCallback,
{
    if records.is_empty() {
        return Ok(Execution::default());
    }

    progress.on_batch_start(records.len());
    let reports = if opts.jobs <= 1 || records.len() == 1 {
        execute_sequential(ctx, connector, records, opts, progress)
    } else {
        execute_parallel(ctx, connector, records, opts, progress)?
    };
    progress.on_batch_complete();

    let mut summary = ExecuteSummary::default();
    for report in &reports {
        summary.add_result(&report.result);
    }

    Ok(Execution { reports, summary })
}

fn execute_sequential<K, C, P>(
    ctx: &Context,
    connector: &C,
    records: &mut [Record<K>],
    opts: &ExecuteOptions,
    progress: &mut P,
) -> Vec<PassReport>
where
    K: ResourceKind,
    C: Connector<K>,
    P: ProgressCallback,
{
    records
        .iter_mut()
        .map(|record| {
            progress.on_record_start(&record.name);
            let result = reconcile(&pass_context(ctx, opts), connector, record, opts.dry_run);
            progress.on_record_complete(&record.name, &result);
            PassReport {
                name: record.name.clone(),
                result,
            }
        })
        .collect()
}

/// Execute passes in parallel using rayon
fn execute_parallel<K, C, P>(
    ctx: &Context,
    connector: &C,
    records: &mut [Record<K>],
    opts: &ExecuteOptions,
    progress: &mut P,
) -> Result<Vec<PassReport>>
where
    K: ResourceKind,
    C: Connector<K>,
    P: ProgressCallback,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {}", e))?;

    let reports: Vec<PassReport> = pool.install(|| {
        records
            .par_iter_mut()
            .map(|record| PassReport {
                name: record.name.clone(),
                result: reconcile(&pass_context(ctx, opts), connector, record, opts.dry_run),
            })
            .collect()
    });

    // The callback is not shared across threads; report once all passes are in
    for report in &reports {
        progress.on_record_complete(&report.name, &report.result);
    }

    Ok(reports)
}

/// Context for one pass; its deadline starts when the pass does
fn pass_context(ctx: &Context, opts: &ExecuteOptions) -> Context {
    match opts.pass_timeout {
        Some(timeout) => ctx.child_with_timeout(timeout),
        None => ctx.clone(),
    }
}
