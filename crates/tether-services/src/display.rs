// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Display bridge — WindowManager/Display through the
// `io/tether/android/TetherDisplay` peer. Layout and rotation changes are
// redelivered with the fresh geometry attached.

use std::sync::{Arc, Mutex};

use tether_core::{DisplayMetrics, Orientation};
use tether_link::handle::{registry, PeerHandle};
use tether_link::notify::{Notifier, Subscription};
use tracing::warn;

use crate::traits::DisplayBackend;

pub(crate) struct DisplayShared {
    pub(crate) layout: Notifier<DisplayMetrics>,
    pub(crate) last: Mutex<Option<DisplayMetrics>>,
}

/// Observes the display's geometry and layout changes.
pub struct DisplayWatcher {
    shared: Arc<DisplayShared>,
    backend: Box<dyn DisplayBackend>,
}

impl DisplayWatcher {
    pub fn new() -> Self {
        let shared = Arc::new(DisplayShared {
            layout: Notifier::new(),
            last: Mutex::new(None),
        });
        let backend = make_backend(&shared);
        Self { shared, backend }
    }

    /// Current geometry, queried from the platform; falls back to the last
    /// observed layout event, and `None` before any.
    pub fn metrics(&self) -> Option<DisplayMetrics> {
        match self.backend.metrics() {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                warn!(error = %e, "display metrics query failed");
                self.shared.last.lock().expect("display cache poisoned").clone()
            }
        }
    }

    pub fn on_layout_changed(
        &self,
        f: impl Fn(&DisplayMetrics) + Send + Sync + 'static,
    ) -> Subscription {
        self.shared.layout.subscribe(f)
    }

    pub fn unsubscribe(&self, sub: Subscription) {
        self.shared.layout.unsubscribe(sub);
    }
}

impl Default for DisplayWatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn make_backend(shared: &Arc<DisplayShared>) -> Box<dyn DisplayBackend> {
    #[cfg(target_os = "android")]
    {
        Box::new(crate::android::AndroidDisplay::link(shared))
    }
    #[cfg(not(target_os = "android"))]
    {
        let _ = shared;
        Box::new(crate::stub::StubDisplay)
    }
}

/// Route a layout change from the boundary.
pub fn dispatch_layout_changed(
    handle: PeerHandle,
    width_px: i32,
    height_px: i32,
    density: f32,
    rotation: i32,
) {
    let Some(shared) = registry().resolve::<DisplayShared>(handle) else {
        return;
    };
    if width_px <= 0 || height_px <= 0 {
        warn!(width_px, height_px, "layout change with impossible geometry dropped");
        return;
    }
    let metrics = DisplayMetrics {
        width_px: width_px as u32,
        height_px: height_px as u32,
        density,
        orientation: Orientation::from_android_rotation(rotation),
    };
    *shared.last.lock().expect("display cache poisoned") = Some(metrics.clone());
    shared.layout.emit(&metrics);
}
