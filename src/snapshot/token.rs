//! One-shot staleness tokens.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// A flag that transitions from fresh to stale exactly once, at the moment
/// a newer snapshot replaces the one this token belongs to.
///
/// Carries no pointer back to its snapshot; consumers call the store again
/// after the token fires.
#[derive(Debug, Default)]
pub struct ChangeToken {
    stale: AtomicBool,
    notify: Notify,
}

impl ChangeToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }

    /// Resolve once the token goes stale; returns immediately if it
    /// already is. Safe to call from any number of tasks.
    pub async fn changed(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_stale() {
                return;
            }
            notified.await;
        }
    }

    /// Flip to stale and wake all waiters. Only the first call has any
    /// effect; the store invokes this exactly once per supersession.
    pub(super) fn invalidate(&self) {
        if !self.stale.swap(true, Ordering::AcqRel) {
            self.notify.notify_waiters();
        }
    }
}
