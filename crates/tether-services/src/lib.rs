// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tether — platform service bridges.
//
// Each module wraps one Android service behind the linking machinery from
// `tether-link`: a peer object constructed with the owner's handle, trait
// methods forwarded by name and signature, callbacks routed back through
// the handle registry and re-emitted as notifications. Desktop builds get
// stub backends so application code compiles and runs everywhere.
//
// Failure policy, uniformly: a failed remote call is logged and degrades to
// a default return (`false`, `0`, `None`, empty, or a silent no-op). No
// public operation here panics on a runtime condition.

pub mod traits;

pub mod contacts;
pub mod display;
pub mod location;
pub mod power;
pub mod preferences;
pub mod sensors;
pub mod toast;
pub mod vibration;
pub mod view_render;

#[cfg(target_os = "android")]
pub mod android;

#[cfg(not(target_os = "android"))]
pub mod stub;

pub use contacts::ContactBook;
pub use display::DisplayWatcher;
pub use location::LocationTracker;
pub use power::WakeLock;
pub use preferences::{PrefValue, Preferences};
pub use sensors::SensorMonitor;
pub use toast::Toasts;
pub use vibration::Vibrator;
pub use view_render::ViewRenderer;
