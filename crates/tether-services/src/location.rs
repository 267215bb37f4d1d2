// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Location bridge — android.location.LocationManager through the
// `io/tether/android/TetherLocation` peer.
//
// Fixes, provider toggles, and permission refusals are all redelivered as
// `LocationEvent`s; a refused runtime permission is a notification the
// application can react to, never a hard failure.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tether_core::config::BridgeConfig;
use tether_core::{GeoPosition, LocationEvent, LocationProvider};
use tether_link::handle::{registry, PeerHandle};
use tether_link::notify::{Notifier, Subscription};
use tracing::warn;

use crate::traits::LocationBackend;

pub(crate) struct LocationShared {
    pub(crate) events: Notifier<LocationEvent>,
    pub(crate) last: Mutex<Option<GeoPosition>>,
}

impl LocationShared {
    fn new() -> Self {
        Self {
            events: Notifier::new(),
            last: Mutex::new(None),
        }
    }
}

/// Subscribes to position updates from one location source.
pub struct LocationTracker {
    provider: LocationProvider,
    shared: Arc<LocationShared>,
    backend: Box<dyn LocationBackend>,
}

impl LocationTracker {
    pub fn new(provider: LocationProvider) -> Self {
        Self::with_config(provider, &BridgeConfig::default())
    }

    pub fn with_config(provider: LocationProvider, config: &BridgeConfig) -> Self {
        let shared = Arc::new(LocationShared::new());
        let backend = make_backend(&shared, config);
        Self {
            provider,
            shared,
            backend,
        }
    }

    pub fn provider(&self) -> LocationProvider {
        self.provider
    }

    /// Begin periodic updates. Returns whether the platform accepted the
    /// request; a missing runtime permission surfaces later as a
    /// `PermissionRequired` event, not as `false` here.
    pub fn start_updates(&self) -> bool {
        match self.backend.start_updates(self.provider) {
            Ok(()) => true,
            Err(e) => {
                warn!(provider = ?self.provider, error = %e, "location start failed");
                false
            }
        }
    }

    pub fn stop_updates(&self) {
        if let Err(e) = self.backend.stop_updates() {
            warn!(provider = ?self.provider, error = %e, "location stop failed");
        }
    }

    /// Ask the source for one fix outside the periodic schedule.
    ///
    /// # Panics
    ///
    /// The passive provider only observes fixes requested by others; asking
    /// it for an immediate fix is a programming error, not a runtime
    /// condition.
    pub fn request_immediate_fix(&self) {
        if self.provider == LocationProvider::Passive {
            unimplemented!("the passive location provider cannot serve an immediate fix");
        }
        if let Err(e) = self.backend.request_immediate_fix() {
            warn!(provider = ?self.provider, error = %e, "immediate fix request failed");
        }
    }

    /// The most recent fix, if any has arrived.
    pub fn last_position(&self) -> Option<GeoPosition> {
        self.shared.last.lock().expect("location cache poisoned").clone()
    }

    pub fn on_event(&self, f: impl Fn(&LocationEvent) + Send + Sync + 'static) -> Subscription {
        self.shared.events.subscribe(f)
    }

    pub fn unsubscribe(&self, sub: Subscription) {
        self.shared.events.unsubscribe(sub);
    }
}

fn make_backend(
    shared: &Arc<LocationShared>,
    config: &BridgeConfig,
) -> Box<dyn LocationBackend> {
    #[cfg(target_os = "android")]
    {
        Box::new(crate::android::AndroidLocation::link(shared, config))
    }
    #[cfg(not(target_os = "android"))]
    {
        let _ = (shared, config);
        Box::new(crate::stub::StubLocation)
    }
}

/// Route one fix from the boundary. The peer passes NaN for fields the
/// source did not supply and the epoch-millisecond wall time of the fix.
pub fn dispatch_position(
    handle: PeerHandle,
    latitude: f64,
    longitude: f64,
    altitude: f64,
    accuracy_m: f32,
    speed_mps: f32,
    bearing_deg: f32,
    epoch_millis: i64,
) {
    let Some(shared) = registry().resolve::<LocationShared>(handle) else {
        return;
    };

    let position = GeoPosition {
        latitude,
        longitude,
        altitude: (!altitude.is_nan()).then_some(altitude),
        accuracy_m: (!accuracy_m.is_nan()).then_some(accuracy_m),
        speed_mps: (!speed_mps.is_nan()).then_some(speed_mps),
        bearing_deg: (!bearing_deg.is_nan()).then_some(bearing_deg),
        timestamp: DateTime::<Utc>::from_timestamp_millis(epoch_millis).unwrap_or_else(Utc::now),
    };

    *shared.last.lock().expect("location cache poisoned") = Some(position.clone());
    shared.events.emit(&LocationEvent::Fix(position));
}

/// Route a provider enable/disable toggle from the boundary.
pub fn dispatch_provider_toggle(handle: PeerHandle, provider_code: i32, enabled: bool) {
    let Some(shared) = registry().resolve::<LocationShared>(handle) else {
        return;
    };
    let Some(provider) = LocationProvider::from_android_code(provider_code) else {
        warn!(provider_code, "provider toggle with unknown code dropped");
        return;
    };
    let event = if enabled {
        LocationEvent::ProviderEnabled(provider)
    } else {
        LocationEvent::ProviderDisabled(provider)
    };
    shared.events.emit(&event);
}

/// Route a permission refusal from the boundary.
pub fn dispatch_permission_denied(handle: PeerHandle) {
    let Some(shared) = registry().resolve::<LocationShared>(handle) else {
        return;
    };
    shared.events.emit(&LocationEvent::PermissionRequired);
}
