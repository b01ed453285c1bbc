//! Desired-state records and their status conditions

use crate::error::{Error, Result};
use crate::resource::ResourceKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Condition types tracked on a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionType {
    /// Whether the remote resource is ready for use
    Ready,
    /// Whether the last reconciliation pass succeeded
    Synced,
}

/// Status of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// Reason a condition is in its current status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reason {
    Available,
    Unavailable,
    Creating,
    Deleting,
    ReconcileSuccess,
    ReconcileError,
}

/// A lifecycle status marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: ConditionType,
    pub status: ConditionStatus,
    pub reason: Reason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    fn new(kind: ConditionType, status: ConditionStatus, reason: Reason) -> Self {
        Self {
            kind,
            status,
            reason,
            message: None,
            last_transition_time: Utc::now(),
        }
    }

    /// The remote resource exists and is usable
    pub fn available() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::True, Reason::Available)
    }

    /// The remote resource exists but is not usable
    pub fn unavailable() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, Reason::Unavailable)
    }

    /// The remote resource is being created
    pub fn creating() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, Reason::Creating)
    }

    /// The remote resource is being deleted
    pub fn deleting() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, Reason::Deleting)
    }

    /// The last pass succeeded
    pub fn reconcile_success() -> Self {
        Self::new(
            ConditionType::Synced,
            ConditionStatus::True,
            Reason::ReconcileSuccess,
        )
    }

    /// The last pass failed with `err`
    pub fn reconcile_error(err: &Error) -> Self {
        Self {
            message: Some(err.to_string()),
            ..Self::new(
                ConditionType::Synced,
                ConditionStatus::False,
                Reason::ReconcileError,
            )
        }
    }

    /// Equal in everything but the transition time
    pub fn equivalent(&self, other: &Condition) -> bool {
        self.kind == other.kind
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// What happens to the remote resource when its record is deleted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletionPolicy {
    /// Delete the remote resource
    #[default]
    Delete,
    /// Leave the remote resource in place
    Orphan,
}

/// Observed side of a record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status<O> {
    /// Last-known mirror of the remote attributes
    #[serde(default)]
    pub at_provider: O,
    /// Lifecycle conditions, one per type, in the order first set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl<O> Status<O> {
    /// Set a condition
    ///
    /// A condition of a new type is appended; an existing one of the same
    /// type is replaced in place. Re-setting an equivalent condition keeps the
    /// original transition time.
    pub fn set_condition(&mut self, condition: Condition) {
        match self.conditions.iter_mut().find(|c| c.kind == condition.kind) {
            Some(existing) if existing.equivalent(&condition) => {}
            Some(existing) => *existing = condition,
            None => self.conditions.push(condition),
        }
    }

    /// Get the condition of a type
    pub fn condition(&self, kind: ConditionType) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.kind == kind)
    }
}

/// A desired-state record for one remote resource of kind `K`
///
/// The record is owned by the scheduler, which persists it between passes.
/// A pass mutates it in place: binding the external name after a create,
/// refreshing the observed state and late-initialized spec attributes after a
/// successful observe, and setting conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Record<K: ResourceKind> {
    /// Kind of resource this record describes
    pub kind: String,
    /// Record name; also the identity to create under when the spec
    /// declares none
    pub name: String,
    /// Identity of the remote resource, set once it has been created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_name: Option<String>,
    /// Connection configuration the connector should use
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_config: Option<String>,
    /// The user asked for the remote resource to go away
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deletion_requested: bool,
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
    /// Declared attributes
    #[serde(default)]
    pub spec: K::Spec,
    #[serde(default)]
    pub status: Status<K::Observation>,
}

impl<K: ResourceKind> Record<K> {
    /// Create an unbound record
    pub fn new(name: impl Into<String>, spec: K::Spec) -> Self {
        Self {
            kind: K::KIND.to_string(),
            name: name.into(),
            external_name: None,
            provider_config: None,
            deletion_requested: false,
            deletion_policy: DeletionPolicy::default(),
            spec,
            status: Status::default(),
        }
    }

    /// Fail with `TypeMismatch` unless the record is of kind `K`
    pub fn ensure_kind(&self) -> Result<()> {
        if self.kind == K::KIND {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                expected: K::KIND,
                found: self.kind.clone(),
            })
        }
    }

    /// Identity of the remote resource; empty names count as unset
    pub fn external_name(&self) -> Option<&str> {
        self.external_name.as_deref().filter(|n| !n.is_empty())
    }

    /// Whether the record is bound to a remote resource
    pub fn is_bound(&self) -> bool {
        self.external_name().is_some()
    }

    /// Bind the record to a remote identity
    ///
    /// Re-binding to the same identity is a no-op; a different one is refused.
    pub fn set_external_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        match self.external_name() {
            Some(current) if current != name => Err(Error::ImmutableExternalName {
                current: current.to_string(),
                requested: name,
            }),
            _ => {
                self.external_name = Some(name);
                Ok(())
            }
        }
    }

    /// Unbind the record after its remote resource is gone
    pub fn clear_external_name(&mut self) {
        self.external_name = None;
    }

    /// Set a status condition
    pub fn set_condition(&mut self, condition: Condition) {
        self.status.set_condition(condition);
    }

    /// Get a status condition
    pub fn condition(&self, kind: ConditionType) -> Option<&Condition> {
        self.status.condition(kind)
    }
}
