// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Backend traits for the platform bridges.
//
// Each public bridge object owns one backend chosen at construction: the
// Android implementation (JNI peer, in `android`) or the desktop stub (in
// `stub`). Backends return `Result` and say what went wrong; the public
// wrappers above them apply the failure policy — log, then default.

use tether_core::error::Result;
use tether_core::{
    DisplayMetrics, LocationProvider, SensorKind, ToastDuration, WakeLockKind,
};

/// Sensor start/stop and availability.
pub trait SensorBackend: Send + Sync {
    fn is_available(&self, kind: SensorKind) -> Result<bool>;
    /// Begin delivering readings for `kind`. Idempotent on the peer side.
    fn start(&self, kind: SensorKind) -> Result<()>;
    fn stop(&self, kind: SensorKind) -> Result<()>;
}

/// Location update subscription.
pub trait LocationBackend: Send + Sync {
    fn start_updates(&self, provider: LocationProvider) -> Result<()>;
    fn stop_updates(&self) -> Result<()>;
    /// One-shot fix on sources that support it. The wrapper has already
    /// ruled out sources that cannot serve one.
    fn request_immediate_fix(&self) -> Result<()>;
}

/// Typed key-value storage with caller-supplied defaults.
pub trait PreferencesBackend: Send + Sync {
    fn get_string(&self, key: &str, default: &str) -> Result<String>;
    fn set_string(&self, key: &str, value: &str) -> Result<()>;
    fn get_i32(&self, key: &str, default: i32) -> Result<i32>;
    fn set_i32(&self, key: &str, value: i32) -> Result<()>;
    fn get_i64(&self, key: &str, default: i64) -> Result<i64>;
    fn set_i64(&self, key: &str, value: i64) -> Result<()>;
    fn get_bool(&self, key: &str, default: bool) -> Result<bool>;
    fn set_bool(&self, key: &str, value: bool) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn contains(&self, key: &str) -> Result<bool>;
}

/// System wake lock.
pub trait WakeLockBackend: Send + Sync {
    fn acquire(&self, kind: WakeLockKind) -> Result<()>;
    fn release(&self) -> Result<()>;
    fn is_held(&self) -> Result<bool>;
}

/// Contact book access.
pub trait ContactsBackend: Send + Sync {
    /// The full contact list as a JSON array — the wire format the peer
    /// produces; the wrapper deserializes it.
    fn fetch_json(&self) -> Result<String>;
}

/// Display geometry queries.
pub trait DisplayBackend: Send + Sync {
    fn metrics(&self) -> Result<DisplayMetrics>;
}

/// Transient on-screen notices.
pub trait ToastBackend: Send + Sync {
    fn show(&self, text: &str, duration: ToastDuration) -> Result<()>;
}

/// Device vibrator.
pub trait VibratorBackend: Send + Sync {
    fn has_vibrator(&self) -> Result<bool>;
    fn vibrate(&self, millis: u64) -> Result<()>;
    /// `pattern` alternates off/on durations in milliseconds; `repeat_from`
    /// is an index into it, or `None` for one-shot.
    fn vibrate_pattern(&self, pattern: &[u64], repeat_from: Option<usize>) -> Result<()>;
    fn cancel(&self) -> Result<()>;
}

/// Offscreen view rendering.
pub trait ViewRenderBackend: Send + Sync {
    fn begin(&self, width_px: u32, height_px: u32) -> Result<()>;
    fn request_frame(&self) -> Result<()>;
    fn end(&self) -> Result<()>;
}
