// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Toast bridge — android.widget.Toast through the
// `io/tether/android/TetherToast` peer. Fire-and-forget; a failed toast is
// a log line, nothing more.

use tether_core::ToastDuration;
use tracing::warn;

use crate::traits::ToastBackend;

/// Shows transient on-screen notices.
pub struct Toasts {
    backend: Box<dyn ToastBackend>,
}

impl Toasts {
    pub fn new() -> Self {
        Self {
            backend: make_backend(),
        }
    }

    pub fn show(&self, text: &str, duration: ToastDuration) {
        if let Err(e) = self.backend.show(text, duration) {
            warn!(text, error = %e, "toast suppressed");
        }
    }
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new()
    }
}

fn make_backend() -> Box<dyn ToastBackend> {
    #[cfg(target_os = "android")]
    {
        Box::new(crate::android::AndroidToast::link())
    }
    #[cfg(not(target_os = "android"))]
    {
        Box::new(crate::stub::StubToast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_toast_never_panics() {
        let toasts = Toasts::new();
        toasts.show("saved", ToastDuration::Short);
        toasts.show("", ToastDuration::Long);
    }
}
