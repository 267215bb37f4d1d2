// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Peer handle registry.
//
// The peer side identifies a native object by an opaque integer it received
// at construction and passes back on every callback. Handles are indices
// into this process-wide table, allocated from a monotonic counter — a
// handle value is never reused, so a callback that races object destruction
// resolves to "not found" and is dropped instead of dereferencing freed
// memory.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};

use tracing::{debug, warn};

/// Opaque identifier linking a native object to its peer.
///
/// Zero is the null handle: it is never allocated, and callbacks carrying it
/// are dropped at the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerHandle(u64);

impl PeerHandle {
    /// The null handle.
    pub const NULL: PeerHandle = PeerHandle(0);

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Wire form for the boundary — peers store the handle as a Java `long`.
    pub fn to_jlong(self) -> i64 {
        self.0 as i64
    }

    /// Rebuild a handle from its wire form. Negative values cannot have been
    /// allocated by this registry and collapse to the null handle.
    pub fn from_jlong(raw: i64) -> Self {
        if raw <= 0 { PeerHandle(0) } else { PeerHandle(raw as u64) }
    }
}

impl std::fmt::Display for PeerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Process-wide handle → native object table.
///
/// Entries are weak: the registry never keeps a component alive, it only
/// answers "is this handle still owned, and by whom". Registration happens
/// in the component's constructor, deregistration is the first step of its
/// teardown (before the peer is notified, so a reentrant callback during the
/// going-away window already misses).
pub struct HandleRegistry {
    next: AtomicU64,
    entries: Mutex<HashMap<u64, Weak<dyn Any + Send + Sync>>>,
}

impl HandleRegistry {
    /// A fresh, empty table. Production code shares the process-wide
    /// [`registry`]; isolated tables exist for tests and benchmarks.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Register a native object and allocate its handle.
    pub fn register<T: Any + Send + Sync>(&self, owner: &Arc<T>) -> PeerHandle {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        let erased: Arc<dyn Any + Send + Sync> = owner.clone();
        self.entries
            .lock()
            .expect("handle registry poisoned")
            .insert(id, Arc::downgrade(&erased));
        debug!(handle = id, "registered peer handle");
        PeerHandle(id)
    }

    /// Resolve a handle back to its owning object.
    ///
    /// Every failure mode is a logged drop: the null handle, a handle that
    /// was never allocated or has been deregistered, an owner that is
    /// already gone, or an owner of an unexpected type.
    pub fn resolve<T: Any + Send + Sync>(&self, handle: PeerHandle) -> Option<Arc<T>> {
        if handle.is_null() {
            debug!("callback with null handle dropped");
            return None;
        }
        let weak = {
            let entries = self.entries.lock().expect("handle registry poisoned");
            entries.get(&handle.0).cloned()
        };
        let Some(weak) = weak else {
            warn!(%handle, "callback for unknown handle dropped");
            return None;
        };
        let Some(strong) = weak.upgrade() else {
            warn!(%handle, "callback for dead handle dropped");
            return None;
        };
        match strong.downcast::<T>() {
            Ok(typed) => Some(typed),
            Err(_) => {
                warn!(%handle, "callback handle resolved to unexpected type — dropped");
                None
            }
        }
    }

    /// Remove a handle. Idempotent; resolving it afterwards yields `None`.
    pub fn deregister(&self, handle: PeerHandle) {
        if handle.is_null() {
            return;
        }
        let removed = self
            .entries
            .lock()
            .expect("handle registry poisoned")
            .remove(&handle.0)
            .is_some();
        if removed {
            debug!(%handle, "deregistered peer handle");
        }
    }

    /// Number of live entries (dead weak entries included until deregistered).
    pub fn len(&self) -> usize {
        self.entries.lock().expect("handle registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The process-wide registry all bridges share.
pub fn registry() -> &'static HandleRegistry {
    static REGISTRY: OnceLock<HandleRegistry> = OnceLock::new();
    REGISTRY.get_or_init(HandleRegistry::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Owner {
        tag: u32,
    }

    #[test]
    fn register_resolve_deregister() {
        let reg = HandleRegistry::new();
        let owner = Arc::new(Owner { tag: 7 });
        let handle = reg.register(&owner);

        let resolved: Arc<Owner> = reg.resolve(handle).expect("live handle resolves");
        assert_eq!(resolved.tag, 7);

        reg.deregister(handle);
        assert!(reg.resolve::<Owner>(handle).is_none());
    }

    #[test]
    fn null_handle_is_dropped() {
        let reg = HandleRegistry::new();
        assert!(reg.resolve::<Owner>(PeerHandle::NULL).is_none());
        assert!(reg.resolve::<Owner>(PeerHandle::from_jlong(0)).is_none());
        assert!(reg.resolve::<Owner>(PeerHandle::from_jlong(-5)).is_none());
    }

    #[test]
    fn unknown_handle_is_dropped() {
        let reg = HandleRegistry::new();
        assert!(reg.resolve::<Owner>(PeerHandle::from_jlong(12345)).is_none());
    }

    #[test]
    fn dead_owner_is_dropped() {
        let reg = HandleRegistry::new();
        let handle = {
            let owner = Arc::new(Owner { tag: 1 });
            reg.register(&owner)
            // owner dropped here; registry holds only a weak entry
        };
        assert!(reg.resolve::<Owner>(handle).is_none());
    }

    #[test]
    fn wrong_type_is_dropped() {
        let reg = HandleRegistry::new();
        let owner = Arc::new(Owner { tag: 1 });
        let handle = reg.register(&owner);
        assert!(reg.resolve::<String>(handle).is_none());
    }

    #[test]
    fn handles_are_never_reused() {
        let reg = HandleRegistry::new();
        let a = Arc::new(Owner { tag: 1 });
        let first = reg.register(&a);
        reg.deregister(first);

        let b = Arc::new(Owner { tag: 2 });
        let second = reg.register(&b);
        assert_ne!(first, second);
        // The retired handle stays dead even though a new object exists.
        assert!(reg.resolve::<Owner>(first).is_none());
    }

    #[test]
    fn jlong_round_trip() {
        let reg = HandleRegistry::new();
        let owner = Arc::new(Owner { tag: 9 });
        let handle = reg.register(&owner);
        let wire = handle.to_jlong();
        assert!(wire > 0);
        assert_eq!(PeerHandle::from_jlong(wire), handle);
    }
}
