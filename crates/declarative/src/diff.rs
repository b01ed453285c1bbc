//! Field-level drift between a spec and the remote resource
//!
//! An unset spec attribute is "don't care": it matches whatever the server
//! holds and never produces a [`FieldDiff`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// One declared attribute that disagrees with the remote resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDiff {
    /// Attribute name as it appears on the remote resource
    pub field: String,
    /// Declared value, rendered as JSON
    pub desired: String,
    /// Remote value, rendered as JSON
    pub observed: String,
}

impl FieldDiff {
    /// Create a diff entry, rendering both values as JSON
    pub fn new<D, O>(field: &str, desired: &D, observed: &O) -> Self
    where
        D: Serialize + ?Sized,
        O: Serialize + ?Sized,
    {
        Self {
            field: field.to_string(),
            desired: render(desired),
            observed: render(observed),
        }
    }
}

impl fmt::Display for FieldDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} → {}", self.field, self.observed, self.desired)
    }
}

fn render<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<{e}>"))
}

/// Record a diff for `field` if the declared value is set and differs
pub fn diff_option<T>(diffs: &mut Vec<FieldDiff>, field: &str, desired: &Option<T>, observed: &T)
where
    T: PartialEq + Serialize,
{
    if let Some(d) = desired
        && d != observed
    {
        diffs.push(FieldDiff::new(field, d, observed));
    }
}

/// Record a diff for `field` against an optional remote value
pub fn diff_option_opt<T>(
    diffs: &mut Vec<FieldDiff>,
    field: &str,
    desired: &Option<T>,
    observed: Option<&T>,
) where
    T: PartialEq + Serialize,
{
    if let Some(d) = desired
        && observed != Some(d)
    {
        diffs.push(FieldDiff::new(field, d, &observed));
    }
}

/// Record a diff for a list attribute if it is set and differs
pub fn diff_list<T>(diffs: &mut Vec<FieldDiff>, field: &str, desired: &Option<Vec<T>>, observed: &[T])
where
    T: PartialEq + Serialize,
{
    if let Some(d) = desired
        && d.as_slice() != observed
    {
        diffs.push(FieldDiff::new(field, d, observed));
    }
}
