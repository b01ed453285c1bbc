//! Late initialization helpers
//!
//! Late initialization copies server-assigned values into spec attributes the
//! user left unset. It is additive only: a set attribute is never overwritten,
//! even when the server disagrees.

/// Fill an unset attribute from a non-default remote value
///
/// Returns whether the attribute was filled.
pub fn late_initialize_option<T>(desired: &mut Option<T>, observed: &T) -> bool
where
    T: Clone + Default + PartialEq,
{
    if desired.is_some() || *observed == T::default() {
        return false;
    }
    *desired = Some(observed.clone());
    true
}

/// Fill an unset attribute from an optional remote value
pub fn late_initialize_from<T: Clone>(desired: &mut Option<T>, observed: Option<&T>) -> bool {
    match (desired.as_ref(), observed) {
        (None, Some(value)) => {
            *desired = Some(value.clone());
            true
        }
        _ => false,
    }
}

/// Fill an unset list from a non-empty remote list
pub fn late_initialize_vec<T: Clone>(desired: &mut Option<Vec<T>>, observed: &[T]) -> bool {
    if desired.is_some() || observed.is_empty() {
        return false;
    }
    *desired = Some(observed.to_vec());
    true
}
