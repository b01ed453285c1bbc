//! Resource kind and remote client contracts
//!
//! A [`ResourceKind`] describes one kind of remote resource: what the user
//! declares, what the server reports, and how to map between the two. The
//! lifecycle controller is written once against these traits and shared by
//! every kind.

use crate::context::Context;
use crate::diff::FieldDiff;
use crate::error::Result;
use crate::record::Record;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

/// Field reconciler for one kind of remote resource
///
/// Every function here is pure: no network calls and no shared state, so
/// passes for different records can run concurrently.
///
/// # Example
///
/// ```ignore
/// impl ResourceKind for Team {
///     const KIND: &'static str = "Team";
///     type Spec = TeamParameters;
///     type Remote = RemoteTeam;
///     type Observation = TeamObservation;
///     type CreateRequest = CreateTeam;
///     type UpdateRequest = UpdateTeam;
///
///     fn declared_name(spec: &TeamParameters) -> Option<&str> {
///         spec.name.as_deref()
///     }
///
///     fn late_initialize(spec: &mut TeamParameters, remote: &RemoteTeam) -> bool {
///         late_initialize_option(&mut spec.name, &remote.name)
///     }
///
///     fn diff(spec: &TeamParameters, remote: &RemoteTeam) -> Vec<FieldDiff> {
///         let mut diffs = Vec::new();
///         diff_option(&mut diffs, "name", &spec.name, &remote.name);
///         diffs
///     }
///
///     // observe, create_request, update_request ...
/// }
/// ```
pub trait ResourceKind: Sized + Send + Sync + 'static {
    /// Kind name recorded in every record of this kind
    const KIND: &'static str;

    /// Declared attributes; every attribute is independently optional
    type Spec: Clone
        + fmt::Debug
        + Default
        + PartialEq
        + Serialize
        + DeserializeOwned
        + Send
        + Sync;

    /// Server's view of one resource instance
    type Remote: fmt::Debug;

    /// Mirror of remote attributes kept in the record status
    type Observation: Clone
        + fmt::Debug
        + Default
        + PartialEq
        + Serialize
        + DeserializeOwned
        + Send
        + Sync;

    /// Payload for a create call
    type CreateRequest: fmt::Debug + Serialize;

    /// Payload for an update call
    type UpdateRequest: fmt::Debug + Serialize;

    /// Identity the spec declares for the remote resource, if any
    fn declared_name(spec: &Self::Spec) -> Option<&str>;

    /// Fill unset spec attributes from non-default remote values
    ///
    /// Attributes the user set are never touched. Returns whether anything
    /// was filled.
    fn late_initialize(spec: &mut Self::Spec, remote: &Self::Remote) -> bool;

    /// Set attributes whose value disagrees with the remote resource
    ///
    /// Unset attributes never appear here.
    fn diff(spec: &Self::Spec, remote: &Self::Remote) -> Vec<FieldDiff>;

    /// Whether the remote resource already matches the spec
    fn is_up_to_date(spec: &Self::Spec, remote: &Self::Remote) -> bool {
        Self::diff(spec, remote).is_empty()
    }

    /// Project the remote resource into the record's observed state
    fn observe(remote: &Self::Remote) -> Self::Observation;

    /// Build the create payload; `name` is the identity to create under
    fn create_request(spec: &Self::Spec, name: &str) -> Self::CreateRequest;

    /// Build the update payload from the set attributes of the spec
    fn update_request(spec: &Self::Spec) -> Self::UpdateRequest;
}

/// Client for the remote service holding resources of kind `K`
///
/// Failures must be classifiable as "not found" through
/// [`Error::is_not_found`](crate::Error::is_not_found); every client call
/// receives the caller's [`Context`] unmodified.
pub trait ExternalClient<K: ResourceKind> {
    /// Fetch the resource identified by `id`
    fn get(&self, ctx: &Context, id: &str) -> Result<K::Remote>;

    /// Create a resource, returning the identity it was created under
    fn create(&self, ctx: &Context, request: &K::CreateRequest) -> Result<String>;

    /// Update the resource identified by `id`
    fn update(&self, ctx: &Context, id: &str, request: &K::UpdateRequest) -> Result<()>;

    /// Delete the resource identified by `id`
    fn delete(&self, ctx: &Context, id: &str) -> Result<()>;
}

impl<K: ResourceKind, C: ExternalClient<K> + ?Sized> ExternalClient<K> for Box<C> {
    fn get(&self, ctx: &Context, id: &str) -> Result<K::Remote> {
        (**self).get(ctx, id)
    }

    fn create(&self, ctx: &Context, request: &K::CreateRequest) -> Result<String> {
        (**self).create(ctx, request)
    }

    fn update(&self, ctx: &Context, id: &str, request: &K::UpdateRequest) -> Result<()> {
        (**self).update(ctx, id, request)
    }

    fn delete(&self, ctx: &Context, id: &str) -> Result<()> {
        (**self).delete(ctx, id)
    }
}

/// Supplies a configured client for each reconciliation pass
///
/// Implementations look up whatever connection details the record refers to
/// (server address, credentials) and build a fresh client.
pub trait Connector<K: ResourceKind>: Send + Sync {
    /// Client type this connector builds
    type Client: ExternalClient<K>;

    /// Build a client for `record`
    fn connect(&self, ctx: &Context, record: &Record<K>) -> Result<Self::Client>;
}
