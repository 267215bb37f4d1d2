// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Wake lock bridge — android.os.PowerManager through the
// `io/tether/android/TetherWakeLock` peer.

use tether_core::WakeLockKind;
use tracing::warn;

use crate::traits::WakeLockBackend;

/// Keeps the CPU (and optionally the screen) awake while held.
///
/// The lock is released on drop if still held; leaning on that is a bug in
/// the embedding application, so the drop path logs it.
pub struct WakeLock {
    kind: WakeLockKind,
    backend: Box<dyn WakeLockBackend>,
}

impl WakeLock {
    pub fn new(kind: WakeLockKind) -> Self {
        Self {
            kind,
            backend: make_backend(),
        }
    }

    pub fn kind(&self) -> WakeLockKind {
        self.kind
    }

    /// Acquire the lock. Returns whether the platform granted it.
    pub fn acquire(&self) -> bool {
        match self.backend.acquire(self.kind) {
            Ok(()) => true,
            Err(e) => {
                warn!(kind = ?self.kind, error = %e, "wake lock acquire failed");
                false
            }
        }
    }

    pub fn release(&self) {
        if let Err(e) = self.backend.release() {
            warn!(kind = ?self.kind, error = %e, "wake lock release failed");
        }
    }

    pub fn is_held(&self) -> bool {
        match self.backend.is_held() {
            Ok(held) => held,
            Err(e) => {
                warn!(kind = ?self.kind, error = %e, "wake lock query failed");
                false
            }
        }
    }
}

impl Drop for WakeLock {
    fn drop(&mut self) {
        if self.is_held() {
            warn!(kind = ?self.kind, "wake lock dropped while held — releasing");
            self.release();
        }
    }
}

fn make_backend() -> Box<dyn WakeLockBackend> {
    #[cfg(target_os = "android")]
    {
        Box::new(crate::android::AndroidWakeLock::link())
    }
    #[cfg(not(target_os = "android"))]
    {
        Box::new(crate::stub::StubWakeLock::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_lock_tracks_held_state() {
        let lock = WakeLock::new(WakeLockKind::Partial);
        assert!(!lock.is_held());
        assert!(lock.acquire());
        assert!(lock.is_held());
        lock.release();
        assert!(!lock.is_held());
    }

    #[test]
    fn release_without_acquire_is_a_no_op() {
        let lock = WakeLock::new(WakeLockKind::Partial);
        lock.release();
        assert!(!lock.is_held());
    }

    #[test]
    fn drop_releases_a_held_lock() {
        let lock = WakeLock::new(WakeLockKind::ScreenDim);
        assert!(lock.acquire());
        drop(lock); // must not panic, must log-and-release
    }

    #[test]
    fn kind_is_fixed_at_construction() {
        let lock = WakeLock::new(WakeLockKind::Full);
        assert_eq!(lock.kind(), WakeLockKind::Full);
    }
}
