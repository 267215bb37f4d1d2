// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub backends for desktop/CI builds where the Android runtime is absent.
//
// Hardware-facing backends return `PlatformUnavailable` and let the public
// wrappers degrade to their documented defaults. Preferences and wake locks
// get functional in-process fallbacks instead — desktop builds of a mobile
// app still want settings that stick and a "keep awake" flag they can query.

#![cfg(not(target_os = "android"))]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use tether_core::error::{Result, TetherError};
use tether_core::{
    DisplayMetrics, LocationProvider, SensorKind, ToastDuration, WakeLockKind,
};
use tracing::{debug, warn};

use crate::preferences::PrefValue;
use crate::traits::*;

/// No sensors on the desk.
pub struct StubSensors;

impl SensorBackend for StubSensors {
    fn is_available(&self, _kind: SensorKind) -> Result<bool> {
        Err(TetherError::PlatformUnavailable)
    }

    fn start(&self, kind: SensorKind) -> Result<()> {
        warn!(?kind, "sensor start on stub backend");
        Err(TetherError::PlatformUnavailable)
    }

    fn stop(&self, _kind: SensorKind) -> Result<()> {
        Err(TetherError::PlatformUnavailable)
    }
}

/// No location sources either.
pub struct StubLocation;

impl LocationBackend for StubLocation {
    fn start_updates(&self, provider: LocationProvider) -> Result<()> {
        warn!(?provider, "location start on stub backend");
        Err(TetherError::PlatformUnavailable)
    }

    fn stop_updates(&self) -> Result<()> {
        Err(TetherError::PlatformUnavailable)
    }

    fn request_immediate_fix(&self) -> Result<()> {
        Err(TetherError::PlatformUnavailable)
    }
}

/// In-process preference store, optionally written through to a JSON file.
pub struct StubPreferences {
    entries: Mutex<HashMap<String, PrefValue>>,
    file: Option<PathBuf>,
}

impl StubPreferences {
    pub fn in_memory() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            file: None,
        }
    }

    /// Load from `path` if it exists; every change is written back.
    pub fn with_file(path: PathBuf) -> Self {
        let entries = match std::fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "preference file unreadable — starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(), // first run
        };
        Self {
            entries: Mutex::new(entries),
            file: Some(path),
        }
    }

    fn persist(&self, entries: &HashMap<String, PrefValue>) {
        let Some(path) = &self.file else {
            return;
        };
        let json = match serde_json::to_string_pretty(entries) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "preference serialization failed");
                return;
            }
        };
        if let Err(e) = std::fs::write(path, json) {
            warn!(path = %path.display(), error = %e, "preference file write failed");
        }
    }

    fn set(&self, key: &str, value: PrefValue) -> Result<()> {
        let mut entries = self.entries.lock().expect("stub prefs poisoned");
        entries.insert(key.to_owned(), value);
        self.persist(&entries);
        Ok(())
    }

    fn get(&self, key: &str) -> Option<PrefValue> {
        self.entries
            .lock()
            .expect("stub prefs poisoned")
            .get(key)
            .cloned()
    }
}

impl PreferencesBackend for StubPreferences {
    fn get_string(&self, key: &str, default: &str) -> Result<String> {
        Ok(match self.get(key) {
            Some(PrefValue::Str(s)) => s,
            _ => default.to_owned(),
        })
    }

    fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.set(key, PrefValue::Str(value.to_owned()))
    }

    fn get_i32(&self, key: &str, default: i32) -> Result<i32> {
        Ok(match self.get(key) {
            Some(PrefValue::I32(v)) => v,
            _ => default,
        })
    }

    fn set_i32(&self, key: &str, value: i32) -> Result<()> {
        self.set(key, PrefValue::I32(value))
    }

    fn get_i64(&self, key: &str, default: i64) -> Result<i64> {
        Ok(match self.get(key) {
            Some(PrefValue::I64(v)) => v,
            _ => default,
        })
    }

    fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        self.set(key, PrefValue::I64(value))
    }

    fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        Ok(match self.get(key) {
            Some(PrefValue::Bool(v)) => v,
            _ => default,
        })
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.set(key, PrefValue::Bool(value))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().expect("stub prefs poisoned");
        entries.remove(key);
        self.persist(&entries);
        Ok(())
    }

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self
            .entries
            .lock()
            .expect("stub prefs poisoned")
            .contains_key(key))
    }
}

/// Tracks held state locally; there is no CPU to keep awake here.
pub struct StubWakeLock {
    held: Mutex<bool>,
}

impl StubWakeLock {
    pub fn new() -> Self {
        Self {
            held: Mutex::new(false),
        }
    }
}

impl WakeLockBackend for StubWakeLock {
    fn acquire(&self, kind: WakeLockKind) -> Result<()> {
        debug!(?kind, "wake lock acquired on stub backend");
        *self.held.lock().expect("stub lock poisoned") = true;
        Ok(())
    }

    fn release(&self) -> Result<()> {
        *self.held.lock().expect("stub lock poisoned") = false;
        Ok(())
    }

    fn is_held(&self) -> Result<bool> {
        Ok(*self.held.lock().expect("stub lock poisoned"))
    }
}

/// No contact provider.
pub struct StubContacts;

impl ContactsBackend for StubContacts {
    fn fetch_json(&self) -> Result<String> {
        Err(TetherError::PlatformUnavailable)
    }
}

/// No display server worth asking.
pub struct StubDisplay;

impl DisplayBackend for StubDisplay {
    fn metrics(&self) -> Result<DisplayMetrics> {
        Err(TetherError::PlatformUnavailable)
    }
}

/// Toasts become log lines.
pub struct StubToast;

impl ToastBackend for StubToast {
    fn show(&self, text: &str, duration: ToastDuration) -> Result<()> {
        debug!(text, ?duration, "toast (stub)");
        Ok(())
    }
}

/// No vibrator.
pub struct StubVibrator;

impl VibratorBackend for StubVibrator {
    fn has_vibrator(&self) -> Result<bool> {
        Ok(false)
    }

    fn vibrate(&self, _millis: u64) -> Result<()> {
        Err(TetherError::PlatformUnavailable)
    }

    fn vibrate_pattern(&self, _pattern: &[u64], _repeat_from: Option<usize>) -> Result<()> {
        Err(TetherError::PlatformUnavailable)
    }

    fn cancel(&self) -> Result<()> {
        Ok(())
    }
}

/// No view hierarchy to render.
pub struct StubViewRenderer;

impl ViewRenderBackend for StubViewRenderer {
    fn begin(&self, _width_px: u32, _height_px: u32) -> Result<()> {
        Err(TetherError::PlatformUnavailable)
    }

    fn request_frame(&self) -> Result<()> {
        Err(TetherError::PlatformUnavailable)
    }

    fn end(&self) -> Result<()> {
        Ok(())
    }
}

impl Default for StubWakeLock {
    fn default() -> Self {
        Self::new()
    }
}
