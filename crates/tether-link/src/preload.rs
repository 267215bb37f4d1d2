// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run-once registration of native method tables, per peer class.
//
// Registering a class's native entry points twice is at best wasted work and
// at worst a hard runtime abort, so every bridge funnels through this
// registry instead of keeping its own "already preloaded" flag. The lock is
// held across the registration function: concurrent first constructions of
// the same component serialize, and the loser observes the winner's entry.

use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

use tether_core::error::Result;
use tracing::{debug, info};

/// Process-wide set of peer classes whose native methods are registered.
pub struct PreloadRegistry {
    loaded: Mutex<HashSet<String>>,
}

impl PreloadRegistry {
    fn new() -> Self {
        Self {
            loaded: Mutex::new(HashSet::new()),
        }
    }

    /// Run `register` unless `class` has already been preloaded.
    ///
    /// Returns `Ok(true)` if registration ran, `Ok(false)` if the class was
    /// already loaded. A failed registration is not recorded, so the next
    /// construction of the component retries it.
    pub fn ensure(&self, class: &str, register: impl FnOnce() -> Result<()>) -> Result<bool> {
        let mut loaded = self.loaded.lock().expect("preload registry poisoned");
        if loaded.contains(class) {
            debug!(class, "peer class already preloaded");
            return Ok(false);
        }
        register()?;
        loaded.insert(class.to_owned());
        info!(class, "peer class preloaded");
        Ok(true)
    }

    /// Whether a class has been preloaded.
    pub fn is_loaded(&self, class: &str) -> bool {
        self.loaded
            .lock()
            .expect("preload registry poisoned")
            .contains(class)
    }

    /// Forget everything. Tests use this for isolation; production code has
    /// no reason to call it — native method registration outlives any
    /// component.
    pub fn reset(&self) {
        self.loaded.lock().expect("preload registry poisoned").clear();
    }
}

/// The process-wide preload registry.
pub fn preloads() -> &'static PreloadRegistry {
    static PRELOADS: OnceLock<PreloadRegistry> = OnceLock::new();
    PRELOADS.get_or_init(PreloadRegistry::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tether_core::TetherError;

    #[test]
    fn registers_exactly_once() {
        let reg = PreloadRegistry::new();
        let runs = AtomicU32::new(0);

        let first = reg
            .ensure("io/tether/android/TetherSensors", || {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        let second = reg
            .ensure("io/tether/android/TetherSensors", || {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        assert!(first);
        assert!(!second);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_registration_can_retry() {
        let reg = PreloadRegistry::new();
        let err = reg.ensure("io/tether/android/TetherToast", || {
            Err(TetherError::PlatformUnavailable)
        });
        assert!(err.is_err());
        assert!(!reg.is_loaded("io/tether/android/TetherToast"));

        let ran = reg
            .ensure("io/tether/android/TetherToast", || Ok(()))
            .unwrap();
        assert!(ran);
        assert!(reg.is_loaded("io/tether/android/TetherToast"));
    }

    #[test]
    fn classes_are_independent() {
        let reg = PreloadRegistry::new();
        reg.ensure("a/B", || Ok(())).unwrap();
        assert!(reg.is_loaded("a/B"));
        assert!(!reg.is_loaded("a/C"));
    }

    #[test]
    fn concurrent_first_use_registers_once() {
        let reg = Arc::new(PreloadRegistry::new());
        let runs = Arc::new(AtomicU32::new(0));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let reg = reg.clone();
                let runs = runs.clone();
                std::thread::spawn(move || {
                    reg.ensure("x/Contended", || {
                        runs.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .unwrap()
                })
            })
            .collect();

        let ran_count = threads
            .into_iter()
            .map(|t| t.join().unwrap())
            .filter(|ran| *ran)
            .count();

        assert_eq!(ran_count, 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reset_clears_state() {
        let reg = PreloadRegistry::new();
        reg.ensure("y/Z", || Ok(())).unwrap();
        reg.reset();
        assert!(!reg.is_loaded("y/Z"));
        assert!(reg.ensure("y/Z", || Ok(())).unwrap());
    }
}
