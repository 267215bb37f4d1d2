// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Object linker — owns the lifecycle of one managed-runtime peer.
//
// Construction order matters: the owner's handle is allocated first so it
// can be embedded as a peer constructor argument, and the class's native
// method table is registered (once, process-wide) before the constructor can
// possibly call back. Teardown is two-phase: the handle leaves the registry
// *before* the peer hears that the native side is going away, so a peer that
// calls back synchronously during that notification resolves to "not found"
// instead of racing destruction.

use std::any::Any;
use std::ffi::c_void;
use std::sync::Arc;

use tether_core::error::{Result, TetherError};
use tracing::{debug, warn};

use crate::handle::{registry, PeerHandle};
use crate::preload::preloads;
use crate::signature::{check_args, CallArg, CallValue, MethodSig};

/// One native entry point exposed to a peer class: callback name, JNI
/// signature, and the `extern "system"` function the runtime should bind.
pub struct NativeMethod {
    pub name: &'static str,
    pub sig: &'static str,
    pub fn_ptr: *mut c_void,
}

impl NativeMethod {
    pub fn new(name: &'static str, sig: &'static str, fn_ptr: *mut c_void) -> Self {
        Self { name, sig, fn_ptr }
    }
}

/// The fixed callback table of one peer class. Built once at preload time
/// and handed to the runtime's registration call; never mutated afterwards.
pub struct NativeMethodTable {
    pub entries: Vec<NativeMethod>,
}

impl NativeMethodTable {
    pub fn new(entries: Vec<NativeMethod>) -> Self {
        Self { entries }
    }
}

/// The façade over one live peer object.
///
/// `call` is the name-and-signature invocation path: arguments are checked
/// against the declared signature (exact widths, no narrowing), marshaled,
/// and the remote failure modes are mapped onto `TetherError`. The Android
/// implementation lives in `crate::android`; tests substitute their own.
pub trait PeerBackend: Send + Sync {
    /// Slash-separated peer class name, for diagnostics.
    fn class_name(&self) -> &str;

    /// Invoke a named instance method on the peer.
    fn call(&self, method: &str, sig: &MethodSig, args: &[CallArg]) -> Result<CallValue>;

    /// Tell the peer the native side is going away. Called exactly once,
    /// after the owner's handle has been deregistered.
    fn notify_native_destroyed(&self) -> Result<()>;
}

/// Owns exactly one peer object on behalf of one native feature object.
pub struct ObjectLinker {
    class: String,
    handle: PeerHandle,
    peer: Option<Box<dyn PeerBackend>>,
}

impl ObjectLinker {
    /// Link `owner` to a freshly constructed peer of `class`.
    ///
    /// `register` runs at most once per class process-wide (the preload
    /// gate); `construct` receives the owner's new handle for embedding as a
    /// constructor argument. Construction failure is terminal for this
    /// linker: the error is logged, `peer()` stays `None`, and the owning
    /// component runs permanently degraded. There is no retry.
    pub fn link_with<T>(
        owner: &Arc<T>,
        class: &str,
        register: impl FnOnce() -> Result<()>,
        construct: impl FnOnce(PeerHandle) -> Result<Box<dyn PeerBackend>>,
    ) -> Self
    where
        T: Any + Send + Sync,
    {
        let handle = registry().register(owner);

        let peer = match preloads()
            .ensure(class, register)
            .and_then(|_| construct(handle))
        {
            Ok(peer) => Some(peer),
            Err(e) => {
                warn!(class, %handle, error = %e, "peer link failed — component degraded");
                None
            }
        };

        Self {
            class: class.to_owned(),
            handle,
            peer,
        }
    }

    /// The handle the peer passes back on callbacks.
    pub fn handle(&self) -> PeerHandle {
        self.handle
    }

    /// The linked peer, or `None` after a failed construction.
    pub fn peer(&self) -> Option<&dyn PeerBackend> {
        self.peer.as_deref()
    }

    pub fn is_linked(&self) -> bool {
        self.peer.is_some()
    }

    /// Invoke a named method on the peer: parse the signature, check the
    /// arguments against it, and dispatch through the backend.
    pub fn invoke(&self, method: &str, signature: &str, args: &[CallArg]) -> Result<CallValue> {
        let peer = self.peer.as_deref().ok_or(TetherError::NoPeer)?;
        let sig = MethodSig::parse(signature)?;
        check_args(method, &sig, args)?;
        peer.call(method, &sig, args)
    }

    /// Two-phase teardown. Safe to call more than once; the second call is a
    /// no-op. Runs from `Drop` as well.
    pub fn unlink(&mut self) {
        // Phase 1: stop callback routing. Anything the peer sends from here
        // on — including reentrant callbacks provoked by the notification
        // below — misses the registry and is dropped.
        registry().deregister(self.handle);

        // Phase 2: notify and release.
        if let Some(peer) = self.peer.take() {
            if let Err(e) = peer.notify_native_destroyed() {
                warn!(class = %self.class, error = %e, "going-away notification failed");
            }
            debug!(class = %self.class, handle = %self.handle, "peer unlinked");
        }
    }
}

impl Drop for ObjectLinker {
    fn drop(&mut self) {
        self.unlink();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct OwnerState {
        name: &'static str,
    }

    /// Backend double that records calls and destroy notifications.
    struct RecordingPeer {
        class: String,
        destroyed: Arc<AtomicU32>,
        calls: Arc<Mutex<Vec<String>>>,
        /// Checked by the teardown test: whether the owner's handle still
        /// resolves at the moment the going-away notification arrives.
        handle: PeerHandle,
        resolvable_at_destroy: Arc<AtomicU32>,
    }

    impl PeerBackend for RecordingPeer {
        fn class_name(&self) -> &str {
            &self.class
        }

        fn call(&self, method: &str, _sig: &MethodSig, _args: &[CallArg]) -> Result<CallValue> {
            self.calls.lock().unwrap().push(method.to_owned());
            Ok(CallValue::Void)
        }

        fn notify_native_destroyed(&self) -> Result<()> {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
            if registry().resolve::<OwnerState>(self.handle).is_some() {
                self.resolvable_at_destroy.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    fn link_recording(
        owner: &Arc<OwnerState>,
        class: &'static str,
        destroyed: Arc<AtomicU32>,
        resolvable: Arc<AtomicU32>,
    ) -> (ObjectLinker, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = calls.clone();
        let linker = ObjectLinker::link_with(
            owner,
            class,
            || Ok(()),
            |handle| {
                Ok(Box::new(RecordingPeer {
                    class: class.to_owned(),
                    destroyed,
                    calls: recorded,
                    handle,
                    resolvable_at_destroy: resolvable,
                }))
            },
        );
        (linker, calls)
    }

    #[test]
    fn linked_peer_receives_invocations() {
        let owner = Arc::new(OwnerState { name: "sensors" });
        let (linker, calls) = link_recording(
            &owner,
            "t/LinkedPeer",
            Arc::new(AtomicU32::new(0)),
            Arc::new(AtomicU32::new(0)),
        );

        assert!(linker.is_linked());
        let result = linker
            .invoke("start", "(I)V", &[CallArg::Int(1)])
            .unwrap();
        assert_eq!(result, CallValue::Void);
        assert_eq!(owner.name, "sensors");
        assert_eq!(*calls.lock().unwrap(), vec!["start"]);

        let peer = linker.peer().expect("peer is linked");
        assert_eq!(peer.class_name(), "t/LinkedPeer");
    }

    #[test]
    fn destroy_notification_fires_exactly_once_after_deregistration() {
        let destroyed = Arc::new(AtomicU32::new(0));
        let resolvable = Arc::new(AtomicU32::new(0));
        let owner = Arc::new(OwnerState { name: "loc" });

        let (mut linker, _calls) =
            link_recording(&owner, "t/TeardownPeer", destroyed.clone(), resolvable.clone());
        let handle = linker.handle();
        assert!(registry().resolve::<OwnerState>(handle).is_some());

        linker.unlink();
        linker.unlink(); // second call is a no-op
        drop(linker); // and so is Drop after an explicit unlink

        assert_eq!(destroyed.load(Ordering::SeqCst), 1);
        // The handle was already gone when the notification ran.
        assert_eq!(resolvable.load(Ordering::SeqCst), 0);
        assert!(registry().resolve::<OwnerState>(handle).is_none());
    }

    #[test]
    fn drop_alone_tears_down() {
        let destroyed = Arc::new(AtomicU32::new(0));
        let owner = Arc::new(OwnerState { name: "contacts" });
        {
            let (_linker, _calls) = link_recording(
                &owner,
                "t/DropPeer",
                destroyed.clone(),
                Arc::new(AtomicU32::new(0)),
            );
        }
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_construction_degrades_permanently() {
        let owner = Arc::new(OwnerState { name: "display" });
        let linker = ObjectLinker::link_with(
            &owner,
            "t/MissingPeer",
            || Ok(()),
            |_| {
                Err(TetherError::PeerConstruction {
                    class: "t/MissingPeer".into(),
                    reason: "class not found".into(),
                })
            },
        );

        assert!(!linker.is_linked());
        assert!(matches!(
            linker.invoke("metrics", "()V", &[]),
            Err(TetherError::NoPeer)
        ));
    }

    #[test]
    fn invoke_checks_signature_before_dispatch() {
        let owner = Arc::new(OwnerState { name: "vib" });
        let (linker, calls) = link_recording(
            &owner,
            "t/SigPeer",
            Arc::new(AtomicU32::new(0)),
            Arc::new(AtomicU32::new(0)),
        );

        // Wrong width: long against an int slot never reaches the peer.
        let err = linker
            .invoke("vibrate", "(I)V", &[CallArg::Long(30)])
            .unwrap_err();
        assert!(matches!(err, TetherError::SignatureMismatch { .. }));
        assert!(calls.lock().unwrap().is_empty());
    }
}
