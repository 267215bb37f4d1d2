// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Domain types delivered by the platform bridges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sensor classes exposed by the sensor bridge.
///
/// The discriminants mirror `android.hardware.Sensor.TYPE_*` so the value
/// crosses the boundary as a plain int.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    Accelerometer,
    MagneticField,
    Gyroscope,
    Light,
    Pressure,
    Proximity,
    Gravity,
    LinearAcceleration,
    RotationVector,
    StepCounter,
}

impl SensorKind {
    /// The `Sensor.TYPE_*` constant for this kind.
    pub fn android_type(&self) -> i32 {
        match self {
            Self::Accelerometer => 1,
            Self::MagneticField => 2,
            Self::Gyroscope => 4,
            Self::Light => 5,
            Self::Pressure => 6,
            Self::Proximity => 8,
            Self::Gravity => 9,
            Self::LinearAcceleration => 10,
            Self::RotationVector => 11,
            Self::StepCounter => 19,
        }
    }

    /// Inverse of [`android_type`](Self::android_type). Unknown codes map to
    /// `None`; new sensor types appear with every Android release.
    pub fn from_android_type(raw: i32) -> Option<Self> {
        match raw {
            1 => Some(Self::Accelerometer),
            2 => Some(Self::MagneticField),
            4 => Some(Self::Gyroscope),
            5 => Some(Self::Light),
            6 => Some(Self::Pressure),
            8 => Some(Self::Proximity),
            9 => Some(Self::Gravity),
            10 => Some(Self::LinearAcceleration),
            11 => Some(Self::RotationVector),
            19 => Some(Self::StepCounter),
            _ => None,
        }
    }
}

/// Reading accuracy reported alongside each sensor event
/// (`SensorManager.SENSOR_STATUS_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorAccuracy {
    NoContact,
    Unreliable,
    Low,
    Medium,
    High,
}

impl SensorAccuracy {
    pub fn from_android_status(raw: i32) -> Self {
        match raw {
            -1 => Self::NoContact,
            1 => Self::Low,
            2 => Self::Medium,
            3 => Self::High,
            _ => Self::Unreliable,
        }
    }
}

/// One sensor event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub kind: SensorKind,
    /// Raw value vector as delivered by the platform; length depends on the
    /// sensor (3 for accelerometer, 1 for light, ...).
    pub values: Vec<f32>,
    pub accuracy: SensorAccuracy,
    /// The platform's event timestamp in nanoseconds since boot, passed
    /// through bit-identically — not wall-clock time.
    pub timestamp_ns: i64,
}

/// Location sources understood by the location bridge
/// (`LocationManager.GPS_PROVIDER` and friends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationProvider {
    Gps,
    Network,
    /// Piggybacks on fixes requested by other applications. Cannot be asked
    /// for an immediate fix.
    Passive,
}

impl LocationProvider {
    /// The provider name string used on the Java side.
    pub fn android_name(&self) -> &'static str {
        match self {
            Self::Gps => "gps",
            Self::Network => "network",
            Self::Passive => "passive",
        }
    }

    /// Compact code used in boundary callbacks, where a string would cost a
    /// reference per event.
    pub fn android_code(&self) -> i32 {
        match self {
            Self::Gps => 0,
            Self::Network => 1,
            Self::Passive => 2,
        }
    }

    pub fn from_android_code(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Gps),
            1 => Some(Self::Network),
            2 => Some(Self::Passive),
            _ => None,
        }
    }
}

/// A geographic fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters above the WGS84 ellipsoid, when the source provides one.
    pub altitude: Option<f64>,
    pub accuracy_m: Option<f32>,
    pub speed_mps: Option<f32>,
    pub bearing_deg: Option<f32>,
    pub timestamp: DateTime<Utc>,
}

/// Notifications re-emitted by the location bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LocationEvent {
    Fix(GeoPosition),
    ProviderEnabled(LocationProvider),
    ProviderDisabled(LocationProvider),
    /// The platform refused updates for lack of a runtime permission. This
    /// is a notification, not an error — the application decides whether to
    /// prompt.
    PermissionRequired,
}

/// A contact book entry, flattened from the platform's contact tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub phone_numbers: Vec<String>,
    #[serde(default)]
    pub emails: Vec<String>,
}

/// Screen rotation (`Surface.ROTATION_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    Landscape,
    PortraitFlipped,
    LandscapeFlipped,
}

impl Orientation {
    pub fn from_android_rotation(raw: i32) -> Self {
        match raw {
            1 => Self::Landscape,
            2 => Self::PortraitFlipped,
            3 => Self::LandscapeFlipped,
            _ => Self::Portrait,
        }
    }
}

/// Current display geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayMetrics {
    pub width_px: u32,
    pub height_px: u32,
    /// Logical density factor (`DisplayMetrics.density`).
    pub density: f32,
    pub orientation: Orientation,
}

/// Wake lock levels (`PowerManager.*_WAKE_LOCK`).
///
/// Only `Partial` is honored on current Android releases; the screen-holding
/// levels remain for apps that still target the legacy API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WakeLockKind {
    Partial,
    ScreenDim,
    ScreenBright,
    Full,
}

impl WakeLockKind {
    pub fn android_level(&self) -> i32 {
        match self {
            Self::Partial => 0x0000_0001,
            Self::ScreenDim => 0x0000_0006,
            Self::ScreenBright => 0x0000_000a,
            Self::Full => 0x0000_001a,
        }
    }
}

/// Toast display duration (`Toast.LENGTH_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToastDuration {
    Short,
    Long,
}

impl ToastDuration {
    pub fn android_length(&self) -> i32 {
        match self {
            Self::Short => 0,
            Self::Long => 1,
        }
    }
}

/// One rendered frame of an offscreen view.
///
/// Pixels are raw ARGB_8888 rows, top to bottom, exactly as copied out of
/// the peer's bitmap. Encoding/decoding is out of scope here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub width_px: u32,
    pub height_px: u32,
    pub pixels: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_kind_android_type_round_trips() {
        for kind in [
            SensorKind::Accelerometer,
            SensorKind::MagneticField,
            SensorKind::Gyroscope,
            SensorKind::Light,
            SensorKind::Pressure,
            SensorKind::Proximity,
            SensorKind::Gravity,
            SensorKind::LinearAcceleration,
            SensorKind::RotationVector,
            SensorKind::StepCounter,
        ] {
            assert_eq!(SensorKind::from_android_type(kind.android_type()), Some(kind));
        }
    }

    #[test]
    fn unknown_sensor_type_is_none() {
        assert_eq!(SensorKind::from_android_type(9999), None);
        assert_eq!(SensorKind::from_android_type(-3), None);
    }

    #[test]
    fn accuracy_status_mapping() {
        assert_eq!(SensorAccuracy::from_android_status(3), SensorAccuracy::High);
        assert_eq!(SensorAccuracy::from_android_status(-1), SensorAccuracy::NoContact);
        // Anything out of range degrades to Unreliable.
        assert_eq!(SensorAccuracy::from_android_status(42), SensorAccuracy::Unreliable);
    }

    #[test]
    fn contact_deserializes_with_missing_lists() {
        let c: Contact = serde_json::from_str(r#"{"id":"7","display_name":"Ada"}"#).unwrap();
        assert_eq!(c.display_name, "Ada");
        assert!(c.phone_numbers.is_empty());
        assert!(c.emails.is_empty());
    }

    #[test]
    fn orientation_rotation_mapping() {
        assert_eq!(Orientation::from_android_rotation(0), Orientation::Portrait);
        assert_eq!(Orientation::from_android_rotation(1), Orientation::Landscape);
        assert_eq!(Orientation::from_android_rotation(3), Orientation::LandscapeFlipped);
    }
}
