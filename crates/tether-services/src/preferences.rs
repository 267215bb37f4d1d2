// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preferences bridge — android.content.SharedPreferences through the
// `io/tether/android/TetherPreferences` peer.
//
// Keys map to typed values with caller-supplied defaults; there is no
// schema. A read under the wrong type returns the default, mirroring what a
// ClassCastException from SharedPreferences degrades to.

use serde::{Deserialize, Serialize};
use tether_core::config::BridgeConfig;
use tracing::warn;

use crate::traits::PreferencesBackend;

/// One stored value. Also the on-disk form of the desktop stub's JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum PrefValue {
    Str(String),
    I32(i32),
    I64(i64),
    Bool(bool),
}

/// Persistent key-value settings.
pub struct Preferences {
    backend: Box<dyn PreferencesBackend>,
}

impl Preferences {
    /// Open the preferences store named in the default configuration.
    pub fn new() -> Self {
        Self::with_config(&BridgeConfig::default())
    }

    pub fn with_config(config: &BridgeConfig) -> Self {
        Self {
            backend: make_backend(config),
        }
    }

    /// Desktop-only: a store backed by a JSON file at `path`, loaded now and
    /// written through on every change.
    #[cfg(not(target_os = "android"))]
    pub fn with_file(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            backend: Box::new(crate::stub::StubPreferences::with_file(path.into())),
        }
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.backend.get_string(key, default).unwrap_or_else(|e| {
            warn!(key, error = %e, "preference read failed");
            default.to_owned()
        })
    }

    pub fn set_string(&self, key: &str, value: &str) {
        if let Err(e) = self.backend.set_string(key, value) {
            warn!(key, error = %e, "preference write failed");
        }
    }

    pub fn get_i32(&self, key: &str, default: i32) -> i32 {
        self.backend.get_i32(key, default).unwrap_or_else(|e| {
            warn!(key, error = %e, "preference read failed");
            default
        })
    }

    pub fn set_i32(&self, key: &str, value: i32) {
        if let Err(e) = self.backend.set_i32(key, value) {
            warn!(key, error = %e, "preference write failed");
        }
    }

    pub fn get_i64(&self, key: &str, default: i64) -> i64 {
        self.backend.get_i64(key, default).unwrap_or_else(|e| {
            warn!(key, error = %e, "preference read failed");
            default
        })
    }

    pub fn set_i64(&self, key: &str, value: i64) {
        if let Err(e) = self.backend.set_i64(key, value) {
            warn!(key, error = %e, "preference write failed");
        }
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.backend.get_bool(key, default).unwrap_or_else(|e| {
            warn!(key, error = %e, "preference read failed");
            default
        })
    }

    pub fn set_bool(&self, key: &str, value: bool) {
        if let Err(e) = self.backend.set_bool(key, value) {
            warn!(key, error = %e, "preference write failed");
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = self.backend.remove(key) {
            warn!(key, error = %e, "preference remove failed");
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.backend.contains(key).unwrap_or_else(|e| {
            warn!(key, error = %e, "preference contains failed");
            false
        })
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self::new()
    }
}

fn make_backend(config: &BridgeConfig) -> Box<dyn PreferencesBackend> {
    #[cfg(target_os = "android")]
    {
        Box::new(crate::android::AndroidPreferences::link(config))
    }
    #[cfg(not(target_os = "android"))]
    {
        let _ = config;
        Box::new(crate::stub::StubPreferences::in_memory())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_returns_written_value() {
        let prefs = Preferences::new();

        prefs.set_string("server", "tether.example");
        prefs.set_i32("retries", 3);
        prefs.set_i64("last_sync", 1_754_000_000_123);
        prefs.set_bool("telemetry", true);

        assert_eq!(prefs.get_string("server", "fallback"), "tether.example");
        assert_eq!(prefs.get_i32("retries", 0), 3);
        assert_eq!(prefs.get_i64("last_sync", 0), 1_754_000_000_123);
        assert!(prefs.get_bool("telemetry", false));
    }

    #[test]
    fn never_written_key_returns_caller_default() {
        let prefs = Preferences::new();
        assert_eq!(prefs.get_string("missing", "fallback"), "fallback");
        assert_eq!(prefs.get_i32("missing", -7), -7);
        assert_eq!(prefs.get_i64("missing", i64::MIN), i64::MIN);
        assert!(prefs.get_bool("missing", true));
        assert!(!prefs.contains("missing"));
    }

    #[test]
    fn i64_round_trips_bit_identically() {
        let prefs = Preferences::new();
        for v in [0, -1, i64::MIN, i64::MAX, 0x0123_4567_89ab_cdef] {
            prefs.set_i64("wide", v);
            assert_eq!(prefs.get_i64("wide", 0), v);
        }
    }

    #[test]
    fn wrong_type_read_returns_default() {
        let prefs = Preferences::new();
        prefs.set_i32("count", 5);
        assert_eq!(prefs.get_string("count", "not a string"), "not a string");
        assert!(!prefs.get_bool("count", false));
        // The typed entry itself is intact.
        assert_eq!(prefs.get_i32("count", 0), 5);
    }

    #[test]
    fn remove_forgets_the_key() {
        let prefs = Preferences::new();
        prefs.set_bool("flag", true);
        assert!(prefs.contains("flag"));
        prefs.remove("flag");
        assert!(!prefs.contains("flag"));
        assert!(!prefs.get_bool("flag", false));
    }

    #[test]
    fn overwrite_replaces_value_and_type() {
        let prefs = Preferences::new();
        prefs.set_i32("slot", 1);
        prefs.set_string("slot", "two");
        assert_eq!(prefs.get_string("slot", ""), "two");
        assert_eq!(prefs.get_i32("slot", 9), 9);
    }

    #[test]
    fn file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        {
            let prefs = Preferences::with_file(&path);
            prefs.set_string("theme", "dark");
            prefs.set_i64("cursor", 88);
        }

        let reopened = Preferences::with_file(&path);
        assert_eq!(reopened.get_string("theme", "light"), "dark");
        assert_eq!(reopened.get_i64("cursor", 0), 88);
        assert!(!reopened.contains("never"));
    }
}
