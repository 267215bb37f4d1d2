// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Notification signal — how boundary callbacks reach application code.
//
// A callback arrives on whatever thread the platform runtime chose; the
// subscriber list is therefore snapshotted out of the lock before invoking,
// so a handler may subscribe or unsubscribe reentrantly without deadlock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Identifies one subscription on one [`Notifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Multi-subscriber notification signal.
///
/// Handlers run in subscription order, on the thread that calls `emit` —
/// which for boundary callbacks is a runtime thread, not the GUI thread.
/// Subscribers needing thread affinity hop through the executor themselves.
pub struct Notifier<T> {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(u64, Handler<T>)>>,
}

impl<T> Notifier<T> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            handlers: Mutex::new(Vec::new()),
        }
    }

    /// Register a handler; the returned token unsubscribes it.
    pub fn subscribe(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .lock()
            .expect("notifier poisoned")
            .push((id, Arc::new(handler)));
        Subscription(id)
    }

    /// Remove a subscription. Unknown tokens are ignored.
    pub fn unsubscribe(&self, subscription: Subscription) {
        self.handlers
            .lock()
            .expect("notifier poisoned")
            .retain(|(id, _)| *id != subscription.0);
    }

    /// Deliver `event` to every current subscriber, in subscription order.
    pub fn emit(&self, event: &T) {
        let snapshot: Vec<Handler<T>> = self
            .handlers
            .lock()
            .expect("notifier poisoned")
            .iter()
            .map(|(_, h)| h.clone())
            .collect();
        for handler in snapshot {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.lock().expect("notifier poisoned").len()
    }
}

impl<T> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}
