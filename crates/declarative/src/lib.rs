//! # Declarative
//!
//! Reconcile a declared resource record against the live state of a remote
//! service, so the remote state converges to, and stays at, what the user
//! declared.
//!
//! ## Core Concepts
//!
//! - **ResourceKind**: Field reconciler for one kind of remote resource:
//!   late initialization, drift detection, and request building
//! - **Record**: The desired-state record for one remote resource
//! - **External**: The lifecycle controller (Observe, Create, Update, Delete)
//! - **reconcile**: One scheduler pass: observe, then at most one mutation
//! - **execute**: Many independent passes, in parallel
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{Context, Record, reconcile};
//!
//! let mut record = Record::<Project>::new("team-a", ProjectParameters {
//!     name: Some("team-a".into()),
//!     ..Default::default()
//! });
//!
//! // First pass creates and binds the record
//! let outcome = reconcile(&Context::background(), &connector, &mut record, false)?;
//! assert!(record.is_bound());
//!
//! // Persist the record before the next pass, or the identity is lost
//! save(&record)?;
//! ```
//!
//! ## Provider Traits
//!
//! The crate uses traits for dependency injection:
//!
//! - [`ResourceKind`]: Maps between declared and remote attributes
//! - [`ExternalClient`]: Get/Create/Update/Delete against the remote service
//! - [`Connector`]: Builds a client for a record
//! - [`ProgressCallback`]: Receives progress updates
//!
//! Nothing here holds state across passes, so passes for different records
//! can run concurrently. Errors are returned, never retried.

pub mod context;
pub mod controller;
pub mod diff;
pub mod error;
pub mod executor;
pub mod lateinit;
pub mod reconciler;
pub mod record;
pub mod resource;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use context::Context;
pub use controller::{External, ExternalCreation, ExternalObservation, ExternalUpdate};
pub use diff::{FieldDiff, diff_list, diff_option, diff_option_opt};
pub use error::{Code, Error, ErrorCategory, Operation, Result};
pub use executor::{Execution, NoProgress, ProgressCallback, execute};
pub use lateinit::{late_initialize_from, late_initialize_option, late_initialize_vec};
pub use reconciler::{Action, Outcome, plan, reconcile};
pub use record::{
    Condition, ConditionStatus, ConditionType, DeletionPolicy, Reason, Record, Status,
};
pub use resource::{Connector, ExternalClient, ResourceKind};
pub use types::{ExecuteOptions, ExecuteSummary, PassReport};
