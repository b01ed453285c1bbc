//! Cancellation context passed through every remote call
//!
//! The controller never blocks on its own; it hands the context it was given
//! to the client, which decides when to give up.

use crate::error::{Code, Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Cancellation token with an optional deadline
///
/// Clones share the same cancellation flag, so cancelling any clone cancels
/// all of them.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled unless asked to
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::default(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// A context that shares this one's cancellation and expires after
    /// `timeout`, or at this context's deadline if that comes first
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now().checked_add(timeout);
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline: match (self.deadline, deadline) {
                (Some(parent), Some(child)) => Some(parent.min(child)),
                (parent, child) => parent.or(child),
            },
        }
    }

    /// Cancel this context and every clone of it
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Deadline, if one was set
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the context was cancelled or its deadline has passed
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst) || self.is_expired()
    }

    fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Fail with `Canceled` or `DeadlineExceeded` if the context is done
    pub fn check(&self) -> Result<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(Error::rpc(Code::Canceled, "context canceled"));
        }
        if self.is_expired() {
            return Err(Error::rpc(
                Code::DeadlineExceeded,
                "context deadline exceeded",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_is_live() {
        let ctx = Context::background();
        assert!(!ctx.is_cancelled());
        assert!(ctx.check().is_ok());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_cancel_reaches_clones() {
        let ctx = Context::background();
        let clone = ctx.clone();
        ctx.cancel();
        assert!(clone.is_cancelled());
        let err = clone.check().unwrap_err();
        assert_eq!(err.code(), Some(Code::Canceled));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_child_deadline() {
        let parent = Context::background();
        let child = parent.child_with_timeout(Duration::from_secs(60));
        assert!(child.deadline().is_some());
        assert!(child.check().is_ok());

        // Cancellation flows from parent to child
        parent.cancel();
        assert_eq!(child.check().unwrap_err().code(), Some(Code::Canceled));

        // An earlier parent deadline wins
        let parent = Context::with_timeout(Duration::ZERO);
        let child = parent.child_with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[test]
    fn test_expired_deadline() {
        let ctx = Context::with_timeout(Duration::ZERO);
        assert!(ctx.is_cancelled());
        assert_eq!(ctx.check().unwrap_err().code(), Some(Code::DeadlineExceeded));
    }
}
