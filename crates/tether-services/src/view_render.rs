// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Offscreen view renderer — draws a platform view hierarchy into a bitmap
// through the `io/tether/android/TetherViewRenderer` peer and hands each
// frame back as raw ARGB pixels. Texture upload and encoding happen above
// this layer.

use std::sync::Arc;

use tether_core::ViewSnapshot;
use tether_link::handle::{registry, PeerHandle};
use tether_link::notify::{Notifier, Subscription};
use tracing::warn;

use crate::traits::ViewRenderBackend;

pub(crate) struct ViewRenderShared {
    pub(crate) frames: Notifier<ViewSnapshot>,
}

/// Renders an offscreen view and streams its frames.
pub struct ViewRenderer {
    shared: Arc<ViewRenderShared>,
    backend: Box<dyn ViewRenderBackend>,
}

impl ViewRenderer {
    pub fn new() -> Self {
        let shared = Arc::new(ViewRenderShared {
            frames: Notifier::new(),
        });
        let backend = make_backend(&shared);
        Self { shared, backend }
    }

    /// Set up the offscreen surface. Returns whether the platform obliged.
    pub fn begin(&self, width_px: u32, height_px: u32) -> bool {
        if width_px == 0 || height_px == 0 {
            warn!(width_px, height_px, "refusing zero-sized offscreen surface");
            return false;
        }
        match self.backend.begin(width_px, height_px) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "offscreen begin failed");
                false
            }
        }
    }

    /// Ask for one frame; it arrives via [`on_frame`](Self::on_frame).
    pub fn request_frame(&self) {
        if let Err(e) = self.backend.request_frame() {
            warn!(error = %e, "frame request failed");
        }
    }

    pub fn end(&self) {
        if let Err(e) = self.backend.end() {
            warn!(error = %e, "offscreen end failed");
        }
    }

    pub fn on_frame(&self, f: impl Fn(&ViewSnapshot) + Send + Sync + 'static) -> Subscription {
        self.shared.frames.subscribe(f)
    }

    pub fn unsubscribe(&self, sub: Subscription) {
        self.shared.frames.unsubscribe(sub);
    }
}

impl Default for ViewRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn make_backend(shared: &Arc<ViewRenderShared>) -> Box<dyn ViewRenderBackend> {
    #[cfg(target_os = "android")]
    {
        Box::new(crate::android::AndroidViewRenderer::link(shared))
    }
    #[cfg(not(target_os = "android"))]
    {
        let _ = shared;
        Box::new(crate::stub::StubViewRenderer)
    }
}

/// Route one rendered frame from the boundary. The pixel buffer length must
/// match the claimed geometry (4 bytes per pixel) or the frame is dropped.
pub fn dispatch_frame(handle: PeerHandle, width_px: u32, height_px: u32, pixels: Vec<u8>) {
    let Some(shared) = registry().resolve::<ViewRenderShared>(handle) else {
        return;
    };
    let expected = width_px as usize * height_px as usize * 4;
    if pixels.len() != expected {
        warn!(
            got = pixels.len(),
            expected, "frame with mismatched pixel buffer dropped"
        );
        return;
    }
    shared.frames.emit(&ViewSnapshot {
        width_px,
        height_px,
        pixels,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn stub_renderer_declines() {
        let renderer = ViewRenderer::new();
        assert!(!renderer.begin(320, 240));
        assert!(!renderer.begin(0, 240)); // rejected before the backend
        renderer.request_frame();
        renderer.end();
    }

    #[test]
    fn frames_route_by_handle_with_geometry_check() {
        let renderer = ViewRenderer::new();
        let handle = registry().register(&renderer.shared);

        let frames = Arc::new(Mutex::new(Vec::new()));
        let f = frames.clone();
        renderer.on_frame(move |snap| f.lock().unwrap().push(snap.clone()));

        dispatch_frame(handle, 2, 2, vec![0xff; 16]);
        dispatch_frame(handle, 2, 2, vec![0xff; 15]); // short buffer dropped
        dispatch_frame(PeerHandle::NULL, 2, 2, vec![0xff; 16]); // dropped

        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].width_px, 2);
        assert_eq!(frames[0].pixels.len(), 16);

        registry().deregister(handle);
    }
}
