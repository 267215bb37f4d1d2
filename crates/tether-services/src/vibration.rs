// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Vibration bridge — android.os.Vibrator through the
// `io/tether/android/TetherVibrator` peer.
//
// Patterns cross the boundary as a JSON millisecond array; the peer parses
// it into the `long[]` the platform wants. Same transport the contact
// bridge uses, in the other direction.

use tracing::warn;

use crate::traits::VibratorBackend;

/// Drives the device vibrator.
pub struct Vibrator {
    backend: Box<dyn VibratorBackend>,
}

impl Vibrator {
    pub fn new() -> Self {
        Self {
            backend: make_backend(),
        }
    }

    /// Whether the device has a vibrator at all. `false` on any failure.
    pub fn has_vibrator(&self) -> bool {
        match self.backend.has_vibrator() {
            Ok(present) => present,
            Err(e) => {
                warn!(error = %e, "vibrator query failed");
                false
            }
        }
    }

    /// Buzz once for `millis`.
    pub fn vibrate(&self, millis: u64) {
        if millis == 0 {
            return;
        }
        if let Err(e) = self.backend.vibrate(millis) {
            warn!(millis, error = %e, "vibrate failed");
        }
    }

    /// Play `pattern` — alternating off/on durations in milliseconds.
    /// `repeat_from` loops from that index until [`cancel`](Self::cancel).
    pub fn vibrate_pattern(&self, pattern: &[u64], repeat_from: Option<usize>) {
        if pattern.is_empty() {
            return;
        }
        if let Some(index) = repeat_from {
            if index >= pattern.len() {
                warn!(index, len = pattern.len(), "repeat index out of pattern — ignored");
                return;
            }
        }
        if let Err(e) = self.backend.vibrate_pattern(pattern, repeat_from) {
            warn!(error = %e, "vibrate pattern failed");
        }
    }

    pub fn cancel(&self) {
        if let Err(e) = self.backend.cancel() {
            warn!(error = %e, "vibrate cancel failed");
        }
    }
}

impl Default for Vibrator {
    fn default() -> Self {
        Self::new()
    }
}

fn make_backend() -> Box<dyn VibratorBackend> {
    #[cfg(target_os = "android")]
    {
        Box::new(crate::android::AndroidVibrator::link())
    }
    #[cfg(not(target_os = "android"))]
    {
        Box::new(crate::stub::StubVibrator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_vibrator_reports_absent_and_noops() {
        let vibrator = Vibrator::new();
        assert!(!vibrator.has_vibrator());
        vibrator.vibrate(30);
        vibrator.vibrate(0); // filtered before the backend
        vibrator.vibrate_pattern(&[0, 200, 100, 200], None);
        vibrator.vibrate_pattern(&[], None); // filtered
        vibrator.vibrate_pattern(&[0, 100], Some(5)); // bad repeat index, filtered
        vibrator.cancel();
    }
}
