// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use serde::{Deserialize, Serialize};

/// Tuning knobs for the platform bridges.
///
/// The embedding application constructs one of these (or takes the default)
/// and hands it to the components that accept one. Nothing here is hot-
/// reloadable; the values are read at component construction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// How long the executor waits for its queue to drain on shutdown, in
    /// milliseconds. Zero disables the wait — abandoned tasks are counted
    /// and logged instead.
    pub executor_shutdown_wait_ms: u64,
    /// SharedPreferences file name (Android) / settings file stem (desktop).
    pub preferences_file: String,
    /// Requested interval between location fixes, in milliseconds.
    pub location_interval_ms: u64,
    /// Minimum distance between location fixes, in meters.
    pub location_min_distance_m: f32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            executor_shutdown_wait_ms: 2_000,
            preferences_file: "tether_prefs".into(),
            location_interval_ms: 1_000,
            location_min_distance_m: 0.0,
        }
    }
}
