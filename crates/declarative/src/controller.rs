//! Lifecycle controller - Observe, Create, Update and Delete for one record
//!
//! The controller decides nothing about ordering; a scheduler calls
//! [`External::observe`] and then at most one of the mutating operations.
//! Every client error is returned tagged with the operation that failed and
//! is never retried here.

use crate::context::Context;
use crate::diff::FieldDiff;
use crate::error::{Error, Operation, Result};
use crate::record::{Condition, Record};
use crate::resource::{ExternalClient, ResourceKind};
use log::debug;
use std::marker::PhantomData;

/// Result of observing the remote resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExternalObservation {
    /// The remote resource exists
    pub resource_exists: bool,
    /// The remote resource matches the spec
    pub resource_up_to_date: bool,
    /// Late initialization filled at least one spec attribute, so the record
    /// needs persisting even if nothing remote changes
    pub resource_late_initialized: bool,
}

impl ExternalObservation {
    /// The remote resource does not exist
    pub fn absent() -> Self {
        Self::default()
    }
}

/// Result of creating the remote resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExternalCreation {
    /// The record's external name was set and must be persisted before the
    /// next pass, or the created resource is orphaned
    pub external_name_assigned: bool,
}

/// Result of updating the remote resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExternalUpdate;

/// Lifecycle controller for records of kind `K`, talking through client `C`
pub struct External<K, C> {
    client: C,
    _kind: PhantomData<fn() -> K>,
}

impl<K, C> External<K, C>
where
    K: ResourceKind,
    C: ExternalClient<K>,
{
    /// Create a controller around a connected client
    pub fn new(client: C) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    /// Get the underlying client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Observe the remote resource the record is bound to
    ///
    /// An unbound record is reported absent without any remote call. A bound
    /// one whose resource was deleted out of band is reported absent and
    /// marked unavailable. On success the spec
    /// is late-initialized, the observed state replaced, and the record marked
    /// available.
    pub fn observe(&self, ctx: &Context, record: &mut Record<K>) -> Result<ExternalObservation> {
        record.ensure_kind()?;

        let Some(id) = record.external_name().map(str::to_string) else {
            debug!("{} {} is not bound, reporting absent", K::KIND, record.name);
            return Ok(ExternalObservation::absent());
        };

        let remote = match self.client.get(ctx, &id) {
            Ok(remote) => remote,
            Err(e) if e.is_not_found() => {
                debug!("{} {} is gone from the server", K::KIND, id);
                record.set_condition(Condition::unavailable());
                return Ok(ExternalObservation::absent());
            }
            Err(e) => return Err(Error::wrap(Operation::Get, K::KIND, e)),
        };

        let current = record.spec.clone();
        K::late_initialize(&mut record.spec, &remote);

        record.status.at_provider = K::observe(&remote);
        record.set_condition(Condition::available());

        let observation = ExternalObservation {
            resource_exists: true,
            resource_up_to_date: K::is_up_to_date(&record.spec, &remote),
            resource_late_initialized: current != record.spec,
        };
        debug!("observed {} {}: {:?}", K::KIND, id, observation);
        Ok(observation)
    }

    /// Field drift between the record and its remote resource
    ///
    /// Works on a late-initialized copy of the spec and leaves the record
    /// untouched. `None` means the resource does not exist.
    pub fn drift(&self, ctx: &Context, record: &Record<K>) -> Result<Option<Vec<FieldDiff>>> {
        record.ensure_kind()?;

        let Some(id) = record.external_name() else {
            return Ok(None);
        };

        let remote = match self.client.get(ctx, id) {
            Ok(remote) => remote,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(Error::wrap(Operation::Get, K::KIND, e)),
        };

        let mut spec = record.spec.clone();
        K::late_initialize(&mut spec, &remote);
        Ok(Some(K::diff(&spec, &remote)))
    }

    /// Create the remote resource and bind the record to it
    ///
    /// The identity is the spec's declared name, or the record name when the
    /// spec declares none. A record already bound to a different identity is
    /// refused before anything is sent.
    pub fn create(&self, ctx: &Context, record: &mut Record<K>) -> Result<ExternalCreation> {
        record.ensure_kind()?;

        let name = K::declared_name(&record.spec)
            .unwrap_or(&record.name)
            .to_string();
        ensure_same_identity(record.external_name(), &name)?;

        let request = K::create_request(&record.spec, &name);
        debug!("creating {} {}: {:?}", K::KIND, name, request);

        let assigned = self
            .client
            .create(ctx, &request)
            .map_err(|e| Error::wrap(Operation::Create, K::KIND, e))?;

        record.set_external_name(assigned)?;
        Ok(ExternalCreation {
            external_name_assigned: true,
        })
    }

    /// Push the spec's set attributes to the remote resource
    ///
    /// The identity cannot be updated: a declared name that differs from the
    /// bound one is refused before anything is sent.
    pub fn update(&self, ctx: &Context, record: &Record<K>) -> Result<ExternalUpdate> {
        record.ensure_kind()?;
        let id = bound_name(record)?;
        if let Some(declared) = K::declared_name(&record.spec) {
            ensure_same_identity(Some(id), declared)?;
        }

        let request = K::update_request(&record.spec);
        debug!("updating {} {}: {:?}", K::KIND, id, request);

        self.client
            .update(ctx, id, &request)
            .map_err(|e| Error::wrap(Operation::Update, K::KIND, e))?;
        Ok(ExternalUpdate)
    }

    /// Delete the remote resource
    ///
    /// A resource that is already gone counts as deleted.
    pub fn delete(&self, ctx: &Context, record: &Record<K>) -> Result<()> {
        record.ensure_kind()?;
        let id = bound_name(record)?;

        debug!("deleting {} {}", K::KIND, id);
        match self.client.delete(ctx, id) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!("{} {} was already deleted", K::KIND, id);
                Ok(())
            }
            Err(e) => Err(Error::wrap(Operation::Delete, K::KIND, e)),
        }
    }
}

fn ensure_same_identity(current: Option<&str>, requested: &str) -> Result<()> {
    match current {
        Some(current) if current != requested => Err(Error::ImmutableExternalName {
            current: current.to_string(),
            requested: requested.to_string(),
        }),
        _ => Ok(()),
    }
}

fn bound_name<K: ResourceKind>(record: &Record<K>) -> Result<&str> {
    record.external_name().ok_or_else(|| Error::NotBound {
        kind: K::KIND,
        name: record.name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Code, ErrorCategory};
    use crate::record::{ConditionType, Reason};
    use crate::testing::{FakeServer, RemoteWidget, Widget, WidgetSpec};

    fn record(name: Option<&str>, color: Option<&str>) -> Record<Widget> {
        Record::new(
            "widget",
            WidgetSpec {
                name: name.map(str::to_string),
                color: color.map(str::to_string),
            },
        )
    }

    fn controller(server: &FakeServer) -> External<Widget, FakeServer> {
        External::new(server.clone())
    }

    #[test]
    fn test_observe_unbound_makes_no_call() {
        let server = FakeServer::default();
        let mut rec = record(Some("team-a"), None);

        let obs = controller(&server).observe(&Context::background(), &mut rec).unwrap();

        assert!(!obs.resource_exists);
        assert!(server.calls().is_empty());
        assert!(rec.status.conditions.is_empty());
    }

    #[test]
    fn test_observe_not_found_reports_absent() {
        let server = FakeServer::default();
        let mut rec = record(Some("team-a"), None);
        rec.external_name = Some("team-a".into());

        let obs = controller(&server).observe(&Context::background(), &mut rec).unwrap();

        assert!(!obs.resource_exists);
        assert_eq!(server.calls(), vec!["get team-a"]);
        assert!(rec.is_bound());
        assert_eq!(
            rec.condition(ConditionType::Ready).unwrap().reason,
            Reason::Unavailable
        );
    }

    #[test]
    fn test_codeless_failure_is_not_treated_as_absent() {
        let server = FakeServer::default();
        server.insert(RemoteWidget::new("team-a", "green"));
        server.fail_with_text("delete", "rpc error: code = NotFound desc = quota team-a");
        let mut rec = record(Some("team-a"), None);
        rec.external_name = Some("team-a".into());

        let err = controller(&server)
            .delete(&Context::background(), &rec)
            .unwrap_err();
        assert!(!err.is_not_found());
        assert!(err.to_string().starts_with("cannot delete Widget"));
    }

    #[test]
    fn test_observe_error_leaves_record_untouched() {
        let server = FakeServer::default();
        server.insert(RemoteWidget::new("team-a", "red"));
        server.fail("get", Code::Unavailable);
        let mut rec = record(None, None);
        rec.external_name = Some("team-a".into());
        let before = rec.spec.clone();

        let err = controller(&server)
            .observe(&Context::background(), &mut rec)
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Transient);
        assert!(err.to_string().starts_with("cannot get Widget"));
        assert_eq!(rec.spec, before);
        assert!(rec.status.conditions.is_empty());
        assert_eq!(rec.status.at_provider.version, 0);
    }

    #[test]
    fn test_observe_late_initializes_unset_name() {
        let server = FakeServer::default();
        server.insert(RemoteWidget::new("team-b", "blue"));
        let mut rec = record(None, None);
        rec.external_name = Some("team-b".into());

        let obs = controller(&server).observe(&Context::background(), &mut rec).unwrap();

        assert!(obs.resource_exists);
        assert!(obs.resource_up_to_date);
        assert!(obs.resource_late_initialized);
        assert_eq!(rec.spec.name.as_deref(), Some("team-b"));
        assert_eq!(rec.spec.color.as_deref(), Some("blue"));
        assert_eq!(rec.status.at_provider.version, 1);
        assert_eq!(
            rec.condition(ConditionType::Ready).unwrap().reason,
            Reason::Available
        );
    }

    #[test]
    fn test_observe_reports_drift_and_keeps_user_value() {
        let server = FakeServer::default();
        server.insert(RemoteWidget::new("team-a", "green"));
        let mut rec = record(Some("team-a"), Some("red"));
        rec.external_name = Some("team-a".into());

        let obs = controller(&server).observe(&Context::background(), &mut rec).unwrap();

        assert!(obs.resource_exists);
        assert!(!obs.resource_up_to_date);
        assert!(!obs.resource_late_initialized);
        assert_eq!(rec.spec.color.as_deref(), Some("red"));
    }

    #[test]
    fn test_drift_does_not_mutate_record() {
        let server = FakeServer::default();
        server.insert(RemoteWidget::new("team-a", "green"));
        let mut rec = record(None, Some("red"));
        rec.external_name = Some("team-a".into());
        let before = rec.clone();

        let diffs = controller(&server)
            .drift(&Context::background(), &rec)
            .unwrap()
            .unwrap();

        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].field, "color");
        assert_eq!(rec.spec, before.spec);
        assert!(rec.status.conditions.is_empty());
    }

    #[test]
    fn test_drift_of_missing_resource() {
        let server = FakeServer::default();
        let mut rec = record(Some("team-a"), None);
        let ctx = Context::background();

        assert!(controller(&server).drift(&ctx, &rec).unwrap().is_none());
        rec.external_name = Some("team-a".into());
        assert!(controller(&server).drift(&ctx, &rec).unwrap().is_none());
    }

    #[test]
    fn test_create_binds_returned_identity() {
        let server = FakeServer::default();
        let mut rec = record(Some("team-a"), None);

        let created = controller(&server).create(&Context::background(), &mut rec).unwrap();

        assert!(created.external_name_assigned);
        assert_eq!(rec.external_name(), Some("team-a"));
        assert_eq!(server.calls(), vec!["create team-a"]);
        assert!(server.get_widget("team-a").is_some());
    }

    #[test]
    fn test_create_falls_back_to_record_name() {
        let server = FakeServer::default();
        let mut rec = record(None, Some("red"));

        controller(&server).create(&Context::background(), &mut rec).unwrap();
        assert_eq!(rec.external_name(), Some("widget"));
    }

    #[test]
    fn test_create_failure_leaves_record_unbound() {
        let server = FakeServer::default();
        server.fail("create", Code::PermissionDenied);
        let mut rec = record(Some("team-a"), None);

        let err = controller(&server)
            .create(&Context::background(), &mut rec)
            .unwrap_err();

        assert!(err.to_string().starts_with("cannot create Widget"));
        assert!(!rec.is_bound());
    }

    #[test]
    fn test_create_refuses_identity_change() {
        let server = FakeServer::default();
        let mut rec = record(Some("team-new"), None);
        rec.external_name = Some("team-old".into());

        let err = controller(&server)
            .create(&Context::background(), &mut rec)
            .unwrap_err();

        assert!(matches!(err, Error::ImmutableExternalName { .. }));
        assert!(server.calls().is_empty());
    }

    #[test]
    fn test_update_sends_set_attributes() {
        let server = FakeServer::default();
        server.insert(RemoteWidget::new("team-a", "green"));
        let mut rec = record(Some("team-a"), Some("red"));
        rec.external_name = Some("team-a".into());

        controller(&server).update(&Context::background(), &rec).unwrap();

        assert_eq!(server.get_widget("team-a").unwrap().color, "red");
        assert_eq!(server.get_widget("team-a").unwrap().version, 2);
    }

    #[test]
    fn test_update_requires_binding() {
        let server = FakeServer::default();
        let rec = record(Some("team-a"), Some("red"));

        let err = controller(&server)
            .update(&Context::background(), &rec)
            .unwrap_err();
        assert!(matches!(err, Error::NotBound { .. }));
        assert!(server.calls().is_empty());
    }

    #[test]
    fn test_update_refuses_renamed_identity() {
        let server = FakeServer::default();
        server.insert(RemoteWidget::new("team-a", "green"));
        let mut rec = record(Some("team-x"), Some("red"));
        rec.external_name = Some("team-a".into());

        let err = controller(&server)
            .update(&Context::background(), &rec)
            .unwrap_err();

        assert!(matches!(err, Error::ImmutableExternalName { .. }));
        assert!(server.calls().is_empty());
        assert_eq!(server.get_widget("team-a").unwrap().color, "green");
    }

    #[test]
    fn test_update_failure_is_tagged() {
        let server = FakeServer::default();
        server.insert(RemoteWidget::new("team-a", "green"));
        server.fail("update", Code::InvalidArgument);
        let mut rec = record(Some("team-a"), Some("red"));
        rec.external_name = Some("team-a".into());

        let err = controller(&server)
            .update(&Context::background(), &rec)
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidArgument);
        assert!(err.to_string().starts_with("cannot update Widget"));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let server = FakeServer::default();
        server.insert(RemoteWidget::new("team-a", "green"));
        let mut rec = record(Some("team-a"), None);
        rec.external_name = Some("team-a".into());

        let external = controller(&server);
        external.delete(&Context::background(), &rec).unwrap();
        assert!(server.get_widget("team-a").is_none());

        // Already gone: still succeeds
        external.delete(&Context::background(), &rec).unwrap();
    }

    #[test]
    fn test_delete_propagates_other_errors() {
        let server = FakeServer::default();
        server.fail("delete", Code::Unavailable);
        let mut rec = record(Some("team-a"), None);
        rec.external_name = Some("team-a".into());

        let err = controller(&server)
            .delete(&Context::background(), &rec)
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().starts_with("cannot delete Widget"));
    }

    #[test]
    fn test_type_mismatch_is_rejected_before_any_call() {
        let server = FakeServer::default();
        let mut rec = record(Some("team-a"), None);
        rec.kind = "Gadget".into();
        rec.external_name = Some("team-a".into());
        let ctx = Context::background();
        let external = controller(&server);

        assert!(matches!(
            external.observe(&ctx, &mut rec),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(external.create(&ctx, &mut rec).is_err());
        assert!(external.update(&ctx, &rec).is_err());
        assert!(external.delete(&ctx, &rec).is_err());
        assert!(server.calls().is_empty());
    }

    #[test]
    fn test_context_is_forwarded() {
        let server = FakeServer::default();
        server.insert(RemoteWidget::new("team-a", "green"));
        let mut rec = record(Some("team-a"), None);
        rec.external_name = Some("team-a".into());
        let ctx = Context::background();
        ctx.cancel();

        let err = controller(&server).observe(&ctx, &mut rec).unwrap_err();
        assert_eq!(err.code(), Some(Code::Canceled));
    }
}
