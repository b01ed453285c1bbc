//! One reconciliation pass for one record
//!
//! A pass connects, observes, and then issues at most one mutating call. The
//! scheduler owns everything around it: persisting the record afterwards,
//! deciding when the next pass runs, and backing off after failures.

use crate::context::Context;
use crate::controller::{External, ExternalObservation};
use crate::error::{ErrorCategory, Result};
use crate::record::{Condition, DeletionPolicy, Record};
use crate::resource::{Connector, ResourceKind};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a pass will do after observing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Nothing to change
    None,
    /// Create the remote resource
    Create,
    /// Push drifted attributes to the remote resource
    Update,
    /// Delete the remote resource
    Delete,
    /// Release the remote resource without deleting it
    Orphan,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::None => "none",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Orphan => "orphan",
        };
        f.write_str(s)
    }
}

/// Decide the next action from an observation
pub fn plan<K: ResourceKind>(record: &Record<K>, observation: &ExternalObservation) -> Action {
    if record.deletion_requested {
        return match (observation.resource_exists, record.deletion_policy) {
            (false, _) => Action::None,
            (true, DeletionPolicy::Delete) => Action::Delete,
            (true, DeletionPolicy::Orphan) => Action::Orphan,
        };
    }
    if !observation.resource_exists {
        Action::Create
    } else if !observation.resource_up_to_date {
        Action::Update
    } else {
        Action::None
    }
}

/// What a pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The remote resource was created under this identity
    Created { external_name: String },
    /// Drifted attributes were pushed
    Updated,
    /// The remote resource was deleted, or was already gone
    Deleted,
    /// The record was released, leaving the remote resource in place
    Orphaned,
    /// Nothing needed changing
    UpToDate { late_initialized: bool },
    /// Dry run: the action a real pass would take
    Planned(Action),
}

impl Outcome {
    /// Check if the pass changed the remote resource
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created { .. } | Self::Updated | Self::Deleted)
    }

    /// Check if the record no longer refers to a remote resource because
    /// its deletion completed
    pub fn is_finalized(&self) -> bool {
        matches!(self, Self::Deleted | Self::Orphaned)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created { external_name } => write!(f, "created {external_name}"),
            Outcome::Updated => f.write_str("updated"),
            Outcome::Deleted => f.write_str("deleted"),
            Outcome::Orphaned => f.write_str("orphaned"),
            Outcome::UpToDate {
                late_initialized: true,
            } => f.write_str("up to date (late-initialized)"),
            Outcome::UpToDate { .. } => f.write_str("up to date"),
            Outcome::Planned(action) => write!(f, "would {action}"),
        }
    }
}

/// Run one reconciliation pass for `record`
///
/// On success the record is marked synced. On failure the error is recorded
/// as a `ReconcileError` condition and returned; the failed operation itself
/// leaves the record as it was. A record of the wrong kind is returned
/// untouched. Dry runs observe and plan but never mutate the remote resource
/// or set the synced condition.
pub fn reconcile<K, C>(
    ctx: &Context,
    connector: &C,
    record: &mut Record<K>,
    dry_run: bool,
) -> Result<Outcome>
where
    K: ResourceKind,
    C: Connector<K>,
{
    record.ensure_kind()?;

    let result = run_pass(ctx, connector, record, dry_run);
    match &result {
        Ok(outcome) => {
            debug!("{} {}: {}", K::KIND, record.name, outcome);
            if !dry_run {
                record.set_condition(Condition::reconcile_success());
            }
        }
        Err(e) => {
            warn!("{} {}: {}", K::KIND, record.name, e);
            if e.category() != ErrorCategory::TypeMismatch && !dry_run {
                record.set_condition(Condition::reconcile_error(e));
            }
        }
    }
    result
}

fn run_pass<K, C>(
    ctx: &Context,
    connector: &C,
    record: &mut Record<K>,
    dry_run: bool,
) -> Result<Outcome>
where
    K: ResourceKind,
    C: Connector<K>,
{
    let external = External::<K, C::Client>::new(connector.connect(ctx, record)?);
    let observation = external.observe(ctx, record)?;
    let action = plan(record, &observation);

    if dry_run {
        return Ok(Outcome::Planned(action));
    }

    match action {
        Action::Create => {
            external.create(ctx, record)?;
            record.set_condition(Condition::creating());
            let external_name = record.external_name().unwrap_or_default().to_string();
            info!("created {} {}", K::KIND, external_name);
            Ok(Outcome::Created { external_name })
        }
        Action::Update => {
            external.update(ctx, record)?;
            info!("updated {} {}", K::KIND, record.name);
            Ok(Outcome::Updated)
        }
        Action::Delete => {
            external.delete(ctx, record)?;
            record.clear_external_name();
            record.set_condition(Condition::deleting());
            info!("deleted {} {}", K::KIND, record.name);
            Ok(Outcome::Deleted)
        }
        Action::Orphan => {
            record.clear_external_name();
            record.set_condition(Condition::deleting());
            info!("orphaned {} {}", K::KIND, record.name);
            Ok(Outcome::Orphaned)
        }
        Action::None if record.deletion_requested => {
            record.clear_external_name();
            Ok(Outcome::Deleted)
        }
        Action::None => Ok(Outcome::UpToDate {
            late_initialized: observation.resource_late_initialized,
        }),
    }
}
