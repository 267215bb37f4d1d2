// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sensor bridge — android.hardware.SensorManager through the
// `io/tether/android/TetherSensors` peer.
//
// Readings arrive on the runtime's sensor thread, are cached as the
// last-known value per sensor kind, and re-emitted to subscribers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tether_core::{SensorAccuracy, SensorKind, SensorReading};
use tether_link::handle::{registry, PeerHandle};
use tether_link::notify::{Notifier, Subscription};
use tracing::warn;

use crate::traits::SensorBackend;

/// State the boundary callbacks route into, keyed by the owner's handle.
pub(crate) struct SensorShared {
    pub(crate) readings: Notifier<SensorReading>,
    pub(crate) accuracy: Notifier<(SensorKind, SensorAccuracy)>,
    pub(crate) last: Mutex<HashMap<SensorKind, SensorReading>>,
}

impl SensorShared {
    fn new() -> Self {
        Self {
            readings: Notifier::new(),
            accuracy: Notifier::new(),
            last: Mutex::new(HashMap::new()),
        }
    }
}

/// Access to the device's motion and environment sensors.
pub struct SensorMonitor {
    shared: Arc<SensorShared>,
    backend: Box<dyn SensorBackend>,
}

impl SensorMonitor {
    pub fn new() -> Self {
        let shared = Arc::new(SensorShared::new());
        let backend = make_backend(&shared);
        Self { shared, backend }
    }

    /// Whether the device has a sensor of this kind. `false` on any failure.
    pub fn available(&self, kind: SensorKind) -> bool {
        match self.backend.is_available(kind) {
            Ok(present) => present,
            Err(e) => {
                warn!(?kind, error = %e, "sensor availability query failed");
                false
            }
        }
    }

    /// Start delivering readings for `kind`. Returns whether the platform
    /// accepted the subscription.
    pub fn start(&self, kind: SensorKind) -> bool {
        match self.backend.start(kind) {
            Ok(()) => true,
            Err(e) => {
                warn!(?kind, error = %e, "sensor start failed");
                false
            }
        }
    }

    pub fn stop(&self, kind: SensorKind) {
        if let Err(e) = self.backend.stop(kind) {
            warn!(?kind, error = %e, "sensor stop failed");
        }
    }

    /// The most recent reading for `kind`, if any has arrived.
    pub fn last_reading(&self, kind: SensorKind) -> Option<SensorReading> {
        self.shared.last.lock().expect("sensor cache poisoned").get(&kind).cloned()
    }

    pub fn on_reading(&self, f: impl Fn(&SensorReading) + Send + Sync + 'static) -> Subscription {
        self.shared.readings.subscribe(f)
    }

    pub fn unsubscribe_reading(&self, sub: Subscription) {
        self.shared.readings.unsubscribe(sub);
    }

    pub fn on_accuracy_changed(
        &self,
        f: impl Fn(&(SensorKind, SensorAccuracy)) + Send + Sync + 'static,
    ) -> Subscription {
        self.shared.accuracy.subscribe(f)
    }
}

impl Default for SensorMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn make_backend(shared: &Arc<SensorShared>) -> Box<dyn SensorBackend> {
    #[cfg(target_os = "android")]
    {
        Box::new(crate::android::AndroidSensors::link(shared))
    }
    #[cfg(not(target_os = "android"))]
    {
        let _ = shared;
        Box::new(crate::stub::StubSensors)
    }
}

/// Route one sensor reading from the boundary to its owner. Unknown and
/// null handles are dropped by the registry.
pub fn dispatch_reading(handle: PeerHandle, reading: SensorReading) {
    let Some(shared) = registry().resolve::<SensorShared>(handle) else {
        return;
    };
    shared
        .last
        .lock()
        .expect("sensor cache poisoned")
        .insert(reading.kind, reading.clone());
    shared.readings.emit(&reading);
}

/// Route an accuracy change from the boundary to its owner.
pub fn dispatch_accuracy(handle: PeerHandle, kind: SensorKind, accuracy: SensorAccuracy) {
    let Some(shared) = registry().resolve::<SensorShared>(handle) else {
        return;
    };
    shared.accuracy.emit(&(kind, accuracy));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn reading(kind: SensorKind, ts: i64) -> SensorReading {
        SensorReading {
            kind,
            values: vec![0.1, 9.7, 0.3],
            accuracy: SensorAccuracy::High,
            timestamp_ns: ts,
        }
    }

    #[test]
    fn stub_monitor_returns_defaults() {
        let monitor = SensorMonitor::new();
        assert!(!monitor.available(SensorKind::Accelerometer));
        assert!(!monitor.start(SensorKind::Accelerometer));
        monitor.stop(SensorKind::Accelerometer); // no-op, must not panic
        assert!(monitor.last_reading(SensorKind::Accelerometer).is_none());
    }

    #[test]
    fn dispatch_routes_to_registered_owner() {
        let monitor = SensorMonitor::new();
        let handle = registry().register(&monitor.shared);

        let hits = Arc::new(AtomicU32::new(0));
        let h = hits.clone();
        monitor.on_reading(move |r| {
            assert_eq!(r.kind, SensorKind::Gyroscope);
            h.fetch_add(1, Ordering::SeqCst);
        });

        dispatch_reading(handle, reading(SensorKind::Gyroscope, 42));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        let cached = monitor.last_reading(SensorKind::Gyroscope).unwrap();
        assert_eq!(cached.timestamp_ns, 42);

        registry().deregister(handle);
    }

    #[test]
    fn last_reading_tracks_latest_per_kind() {
        let monitor = SensorMonitor::new();
        let handle = registry().register(&monitor.shared);

        dispatch_reading(handle, reading(SensorKind::Light, 1));
        dispatch_reading(handle, reading(SensorKind::Light, 2));
        dispatch_reading(handle, reading(SensorKind::Pressure, 3));

        assert_eq!(monitor.last_reading(SensorKind::Light).unwrap().timestamp_ns, 2);
        assert_eq!(monitor.last_reading(SensorKind::Pressure).unwrap().timestamp_ns, 3);

        registry().deregister(handle);
    }

    #[test]
    fn null_and_stale_handles_are_dropped() {
        let monitor = SensorMonitor::new();
        let handle = registry().register(&monitor.shared);
        registry().deregister(handle);

        // Neither call may panic or mutate anything.
        dispatch_reading(PeerHandle::NULL, reading(SensorKind::Light, 1));
        dispatch_reading(handle, reading(SensorKind::Light, 1));
        dispatch_accuracy(PeerHandle::NULL, SensorKind::Light, SensorAccuracy::Low);

        assert!(monitor.last_reading(SensorKind::Light).is_none());
    }

    #[test]
    fn accuracy_changes_reach_subscribers() {
        let monitor = SensorMonitor::new();
        let handle = registry().register(&monitor.shared);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        monitor.on_accuracy_changed(move |(kind, acc)| {
            s.lock().unwrap().push((*kind, *acc));
        });

        dispatch_accuracy(handle, SensorKind::MagneticField, SensorAccuracy::Medium);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(SensorKind::MagneticField, SensorAccuracy::Medium)]
        );

        registry().deregister(handle);
    }
}
