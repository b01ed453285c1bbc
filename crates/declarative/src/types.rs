//! Batch execution types

use crate::error::Error;
use crate::reconciler::Outcome;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Summary of a batch of passes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub orphaned: usize,
    pub up_to_date: usize,
    pub planned: usize,
    pub failed: usize,
}

impl ExecuteSummary {
    /// Total number of remote changes made
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    /// Check if every pass succeeded
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of passes
    pub fn total(&self) -> usize {
        self.created
            + self.updated
            + self.deleted
            + self.orphaned
            + self.up_to_date
            + self.planned
            + self.failed
    }

    /// Add a pass result to the summary
    pub fn add_result(&mut self, result: &Result<Outcome, Error>) {
        match result {
            Ok(Outcome::Created { .. }) => self.created += 1,
            Ok(Outcome::Updated) => self.updated += 1,
            Ok(Outcome::Deleted) => self.deleted += 1,
            Ok(Outcome::Orphaned) => self.orphaned += 1,
            Ok(Outcome::UpToDate { .. }) => self.up_to_date += 1,
            Ok(Outcome::Planned(_)) => self.planned += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Options for batch execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Observe and plan only
    pub dry_run: bool,
    /// Number of passes to run concurrently
    pub jobs: usize,
    /// Deadline for each pass, counted from when that pass starts
    pub pass_timeout: Option<Duration>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 4,
            pass_timeout: None,
        }
    }
}

/// Result of one pass in a batch
#[derive(Debug)]
pub struct PassReport {
    /// Record name
    pub name: String,
    pub result: Result<Outcome, Error>,
}

impl PassReport {
    /// Check if the pass succeeded
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}
