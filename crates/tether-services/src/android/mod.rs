// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android backends via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. Each backend links one peer object from the
// Tether AAR (`io.tether.android.*`), forwards its trait methods through the
// invocation façade, and registers the peer class's `static native`
// callbacks once per process.
//
// ## Architecture notes
//
// Callback entry points do the minimum on the runtime's thread: convert JNI
// arguments to owned Rust values, then hand off to the platform-neutral
// `dispatch_*` function of the owning module, which routes by handle. All
// policy (caching, notification, validation) lives there, where the host
// tests can reach it.

#![cfg(target_os = "android")]

use std::ffi::c_void;
use std::sync::Arc;

use jni::objects::{JByteArray, JClass, JFloatArray};
use jni::sys::{jboolean, jdouble, jfloat, jint, jlong};
use jni::JNIEnv;

use tether_core::config::BridgeConfig;
use tether_core::error::{Result, TetherError};
use tether_core::{
    DisplayMetrics, LocationProvider, Orientation, SensorAccuracy, SensorKind, SensorReading,
    ToastDuration, WakeLockKind,
};
use tether_link::android::{construct_peer, register_native_table};
use tether_link::handle::PeerHandle;
use tether_link::linker::{NativeMethod, NativeMethodTable, ObjectLinker};
use tether_link::signature::CallArg;
use tracing::warn;

use crate::contacts::{dispatch_contacts_changed, ContactsShared};
use crate::display::{dispatch_layout_changed, DisplayShared};
use crate::location::{
    dispatch_permission_denied, dispatch_position, dispatch_provider_toggle, LocationShared,
};
use crate::sensors::{dispatch_accuracy, dispatch_reading, SensorShared};
use crate::traits::*;
use crate::view_render::{dispatch_frame, ViewRenderShared};

fn non_bool(method: &str) -> TetherError {
    TetherError::RemoteCall(format!("{method} returned a non-boolean result"))
}

fn refused(method: &str) -> TetherError {
    TetherError::RemoteCall(format!("{method} refused by the platform"))
}

// ---------------------------------------------------------------------------
// Sensors — android.hardware.SensorManager
// ---------------------------------------------------------------------------

const SENSORS_CLASS: &str = "io/tether/android/TetherSensors";

pub struct AndroidSensors {
    linker: ObjectLinker,
}

impl AndroidSensors {
    pub(crate) fn link(shared: &Arc<SensorShared>) -> Self {
        let linker = ObjectLinker::link_with(
            shared,
            SENSORS_CLASS,
            || {
                register_native_table(
                    SENSORS_CLASS,
                    &NativeMethodTable::new(vec![
                        NativeMethod::new(
                            "onSensorChanged",
                            "(JI[FIJ)V",
                            on_sensor_changed as *mut c_void,
                        ),
                        NativeMethod::new(
                            "onAccuracyChanged",
                            "(JII)V",
                            on_accuracy_changed as *mut c_void,
                        ),
                    ]),
                )
            },
            |handle| construct_peer(SENSORS_CLASS, handle),
        );
        Self { linker }
    }
}

impl SensorBackend for AndroidSensors {
    fn is_available(&self, kind: SensorKind) -> Result<bool> {
        self.linker
            .invoke("isAvailable", "(I)Z", &[CallArg::Int(kind.android_type())])?
            .as_bool()
            .ok_or_else(|| non_bool("isAvailable"))
    }

    fn start(&self, kind: SensorKind) -> Result<()> {
        let accepted = self
            .linker
            .invoke("start", "(I)Z", &[CallArg::Int(kind.android_type())])?
            .as_bool()
            .ok_or_else(|| non_bool("start"))?;
        if accepted { Ok(()) } else { Err(refused("start")) }
    }

    fn stop(&self, kind: SensorKind) -> Result<()> {
        self.linker
            .invoke("stop", "(I)V", &[CallArg::Int(kind.android_type())])
            .map(|_| ())
    }
}

extern "system" fn on_sensor_changed(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
    sensor_type: jint,
    values: JFloatArray,
    accuracy: jint,
    timestamp_ns: jlong,
) {
    let Some(kind) = SensorKind::from_android_type(sensor_type) else {
        warn!(sensor_type, "reading for unknown sensor type dropped");
        return;
    };

    let len = match env.get_array_length(&values) {
        Ok(len) if len >= 0 => len as usize,
        _ => {
            warn!("sensor reading with unreadable value array dropped");
            return;
        }
    };
    let mut buf = vec![0.0f32; len];
    if env.get_float_array_region(&values, 0, &mut buf).is_err() {
        warn!("sensor reading with unreadable value array dropped");
        return;
    }

    dispatch_reading(
        PeerHandle::from_jlong(handle),
        SensorReading {
            kind,
            values: buf,
            accuracy: SensorAccuracy::from_android_status(accuracy),
            timestamp_ns,
        },
    );
}

extern "system" fn on_accuracy_changed(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    sensor_type: jint,
    accuracy: jint,
) {
    let Some(kind) = SensorKind::from_android_type(sensor_type) else {
        return;
    };
    dispatch_accuracy(
        PeerHandle::from_jlong(handle),
        kind,
        SensorAccuracy::from_android_status(accuracy),
    );
}

// ---------------------------------------------------------------------------
// Location — android.location.LocationManager
// ---------------------------------------------------------------------------

const LOCATION_CLASS: &str = "io/tether/android/TetherLocation";

pub struct AndroidLocation {
    linker: ObjectLinker,
    interval_ms: u64,
    min_distance_m: f32,
}

impl AndroidLocation {
    pub(crate) fn link(shared: &Arc<LocationShared>, config: &BridgeConfig) -> Self {
        let linker = ObjectLinker::link_with(
            shared,
            LOCATION_CLASS,
            || {
                register_native_table(
                    LOCATION_CLASS,
                    &NativeMethodTable::new(vec![
                        NativeMethod::new(
                            "onPositionUpdate",
                            "(JDDDFFFJ)V",
                            on_position_update as *mut c_void,
                        ),
                        NativeMethod::new(
                            "onProviderToggle",
                            "(JIZ)V",
                            on_provider_toggle as *mut c_void,
                        ),
                        NativeMethod::new(
                            "onPermissionDenied",
                            "(J)V",
                            on_permission_denied as *mut c_void,
                        ),
                    ]),
                )
            },
            |handle| construct_peer(LOCATION_CLASS, handle),
        );
        Self {
            linker,
            interval_ms: config.location_interval_ms,
            min_distance_m: config.location_min_distance_m,
        }
    }
}

impl LocationBackend for AndroidLocation {
    fn start_updates(&self, provider: LocationProvider) -> Result<()> {
        let accepted = self
            .linker
            .invoke(
                "startUpdates",
                "(Ljava/lang/String;JF)Z",
                &[
                    CallArg::Str(provider.android_name().to_owned()),
                    CallArg::Long(self.interval_ms as i64),
                    CallArg::Float(self.min_distance_m),
                ],
            )?
            .as_bool()
            .ok_or_else(|| non_bool("startUpdates"))?;
        if accepted { Ok(()) } else { Err(refused("startUpdates")) }
    }

    fn stop_updates(&self) -> Result<()> {
        self.linker.invoke("stopUpdates", "()V", &[]).map(|_| ())
    }

    fn request_immediate_fix(&self) -> Result<()> {
        self.linker
            .invoke("requestImmediateFix", "()V", &[])
            .map(|_| ())
    }
}

#[allow(clippy::too_many_arguments)]
extern "system" fn on_position_update(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    latitude: jdouble,
    longitude: jdouble,
    altitude: jdouble,
    accuracy_m: jfloat,
    speed_mps: jfloat,
    bearing_deg: jfloat,
    epoch_millis: jlong,
) {
    dispatch_position(
        PeerHandle::from_jlong(handle),
        latitude,
        longitude,
        altitude,
        accuracy_m,
        speed_mps,
        bearing_deg,
        epoch_millis,
    );
}

extern "system" fn on_provider_toggle(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    provider_code: jint,
    enabled: jboolean,
) {
    dispatch_provider_toggle(PeerHandle::from_jlong(handle), provider_code, enabled != 0);
}

extern "system" fn on_permission_denied(_env: JNIEnv, _class: JClass, handle: jlong) {
    dispatch_permission_denied(PeerHandle::from_jlong(handle));
}

// ---------------------------------------------------------------------------
// Preferences — android.content.SharedPreferences
// ---------------------------------------------------------------------------

const PREFERENCES_CLASS: &str = "io/tether/android/TetherPreferences";

pub struct AndroidPreferences {
    linker: ObjectLinker,
    _owner: Arc<()>,
}

impl AndroidPreferences {
    pub(crate) fn link(config: &BridgeConfig) -> Self {
        let owner = Arc::new(());
        let linker = ObjectLinker::link_with(
            &owner,
            PREFERENCES_CLASS,
            // No callbacks on this class; the preload gate only records it.
            || Ok(()),
            |handle| construct_peer(PREFERENCES_CLASS, handle),
        );
        // Select the preference file before the first read or write.
        if let Err(e) = linker.invoke(
            "setFile",
            "(Ljava/lang/String;)V",
            &[CallArg::Str(config.preferences_file.clone())],
        ) {
            warn!(error = %e, "preference file selection failed");
        }
        Self {
            linker,
            _owner: owner,
        }
    }
}

impl PreferencesBackend for AndroidPreferences {
    fn get_string(&self, key: &str, default: &str) -> Result<String> {
        let value = self.linker.invoke(
            "getString",
            "(Ljava/lang/String;Ljava/lang/String;)Ljava/lang/String;",
            &[CallArg::Str(key.to_owned()), CallArg::Str(default.to_owned())],
        )?;
        Ok(value.into_string().unwrap_or_else(|| default.to_owned()))
    }

    fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.linker
            .invoke(
                "setString",
                "(Ljava/lang/String;Ljava/lang/String;)V",
                &[CallArg::Str(key.to_owned()), CallArg::Str(value.to_owned())],
            )
            .map(|_| ())
    }

    fn get_i32(&self, key: &str, default: i32) -> Result<i32> {
        let value = self.linker.invoke(
            "getInt",
            "(Ljava/lang/String;I)I",
            &[CallArg::Str(key.to_owned()), CallArg::Int(default)],
        )?;
        Ok(value.as_i32().unwrap_or(default))
    }

    fn set_i32(&self, key: &str, value: i32) -> Result<()> {
        self.linker
            .invoke(
                "setInt",
                "(Ljava/lang/String;I)V",
                &[CallArg::Str(key.to_owned()), CallArg::Int(value)],
            )
            .map(|_| ())
    }

    fn get_i64(&self, key: &str, default: i64) -> Result<i64> {
        let value = self.linker.invoke(
            "getLong",
            "(Ljava/lang/String;J)J",
            &[CallArg::Str(key.to_owned()), CallArg::Long(default)],
        )?;
        Ok(value.as_i64().unwrap_or(default))
    }

    fn set_i64(&self, key: &str, value: i64) -> Result<()> {
        self.linker
            .invoke(
                "setLong",
                "(Ljava/lang/String;J)V",
                &[CallArg::Str(key.to_owned()), CallArg::Long(value)],
            )
            .map(|_| ())
    }

    fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        let value = self.linker.invoke(
            "getBoolean",
            "(Ljava/lang/String;Z)Z",
            &[CallArg::Str(key.to_owned()), CallArg::Bool(default)],
        )?;
        Ok(value.as_bool().unwrap_or(default))
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        self.linker
            .invoke(
                "setBoolean",
                "(Ljava/lang/String;Z)V",
                &[CallArg::Str(key.to_owned()), CallArg::Bool(value)],
            )
            .map(|_| ())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.linker
            .invoke(
                "remove",
                "(Ljava/lang/String;)V",
                &[CallArg::Str(key.to_owned())],
            )
            .map(|_| ())
    }

    fn contains(&self, key: &str) -> Result<bool> {
        self.linker
            .invoke(
                "contains",
                "(Ljava/lang/String;)Z",
                &[CallArg::Str(key.to_owned())],
            )?
            .as_bool()
            .ok_or_else(|| non_bool("contains"))
    }
}

// ---------------------------------------------------------------------------
// Wake locks — android.os.PowerManager
// ---------------------------------------------------------------------------

const WAKELOCK_CLASS: &str = "io/tether/android/TetherWakeLock";

pub struct AndroidWakeLock {
    linker: ObjectLinker,
    _owner: Arc<()>,
}

impl AndroidWakeLock {
    pub(crate) fn link() -> Self {
        let owner = Arc::new(());
        let linker = ObjectLinker::link_with(
            &owner,
            WAKELOCK_CLASS,
            || Ok(()),
            |handle| construct_peer(WAKELOCK_CLASS, handle),
        );
        Self {
            linker,
            _owner: owner,
        }
    }
}

impl WakeLockBackend for AndroidWakeLock {
    fn acquire(&self, kind: WakeLockKind) -> Result<()> {
        let granted = self
            .linker
            .invoke("acquire", "(I)Z", &[CallArg::Int(kind.android_level())])?
            .as_bool()
            .ok_or_else(|| non_bool("acquire"))?;
        if granted { Ok(()) } else { Err(refused("acquire")) }
    }

    fn release(&self) -> Result<()> {
        self.linker.invoke("release", "()V", &[]).map(|_| ())
    }

    fn is_held(&self) -> Result<bool> {
        self.linker
            .invoke("isHeld", "()Z", &[])?
            .as_bool()
            .ok_or_else(|| non_bool("isHeld"))
    }
}

// ---------------------------------------------------------------------------
// Contacts — ContactsContract
// ---------------------------------------------------------------------------

const CONTACTS_CLASS: &str = "io/tether/android/TetherContacts";

pub struct AndroidContacts {
    linker: ObjectLinker,
}

impl AndroidContacts {
    pub(crate) fn link(shared: &Arc<ContactsShared>) -> Self {
        let linker = ObjectLinker::link_with(
            shared,
            CONTACTS_CLASS,
            || {
                register_native_table(
                    CONTACTS_CLASS,
                    &NativeMethodTable::new(vec![NativeMethod::new(
                        "onContactsChanged",
                        "(J)V",
                        on_contacts_changed as *mut c_void,
                    )]),
                )
            },
            |handle| construct_peer(CONTACTS_CLASS, handle),
        );
        Self { linker }
    }
}

impl ContactsBackend for AndroidContacts {
    fn fetch_json(&self) -> Result<String> {
        self.linker
            .invoke("getContactsJson", "()Ljava/lang/String;", &[])?
            .into_string()
            .ok_or_else(|| TetherError::RemoteCall("null contact list".into()))
    }
}

extern "system" fn on_contacts_changed(_env: JNIEnv, _class: JClass, handle: jlong) {
    dispatch_contacts_changed(PeerHandle::from_jlong(handle));
}

// ---------------------------------------------------------------------------
// Display — WindowManager
// ---------------------------------------------------------------------------

const DISPLAY_CLASS: &str = "io/tether/android/TetherDisplay";

pub struct AndroidDisplay {
    linker: ObjectLinker,
}

impl AndroidDisplay {
    pub(crate) fn link(shared: &Arc<DisplayShared>) -> Self {
        let linker = ObjectLinker::link_with(
            shared,
            DISPLAY_CLASS,
            || {
                register_native_table(
                    DISPLAY_CLASS,
                    &NativeMethodTable::new(vec![NativeMethod::new(
                        "onLayoutChanged",
                        "(JIIFI)V",
                        on_layout_changed as *mut c_void,
                    )]),
                )
            },
            |handle| construct_peer(DISPLAY_CLASS, handle),
        );
        Self { linker }
    }
}

impl DisplayBackend for AndroidDisplay {
    fn metrics(&self) -> Result<DisplayMetrics> {
        let width = self
            .linker
            .invoke("getWidth", "()I", &[])?
            .as_i32()
            .unwrap_or(0);
        let height = self
            .linker
            .invoke("getHeight", "()I", &[])?
            .as_i32()
            .unwrap_or(0);
        if width <= 0 || height <= 0 {
            return Err(TetherError::RemoteCall(format!(
                "display reported impossible geometry {width}x{height}"
            )));
        }
        let density = self
            .linker
            .invoke("getDensity", "()F", &[])?
            .as_f32()
            .unwrap_or(1.0);
        let rotation = self
            .linker
            .invoke("getRotation", "()I", &[])?
            .as_i32()
            .unwrap_or(0);

        Ok(DisplayMetrics {
            width_px: width as u32,
            height_px: height as u32,
            density,
            orientation: Orientation::from_android_rotation(rotation),
        })
    }
}

extern "system" fn on_layout_changed(
    _env: JNIEnv,
    _class: JClass,
    handle: jlong,
    width_px: jint,
    height_px: jint,
    density: jfloat,
    rotation: jint,
) {
    dispatch_layout_changed(
        PeerHandle::from_jlong(handle),
        width_px,
        height_px,
        density,
        rotation,
    );
}

// ---------------------------------------------------------------------------
// Toasts — android.widget.Toast
// ---------------------------------------------------------------------------

const TOAST_CLASS: &str = "io/tether/android/TetherToast";

pub struct AndroidToast {
    linker: ObjectLinker,
    _owner: Arc<()>,
}

impl AndroidToast {
    pub(crate) fn link() -> Self {
        let owner = Arc::new(());
        let linker = ObjectLinker::link_with(
            &owner,
            TOAST_CLASS,
            || Ok(()),
            |handle| construct_peer(TOAST_CLASS, handle),
        );
        Self {
            linker,
            _owner: owner,
        }
    }
}

impl ToastBackend for AndroidToast {
    fn show(&self, text: &str, duration: ToastDuration) -> Result<()> {
        self.linker
            .invoke(
                "show",
                "(Ljava/lang/String;I)V",
                &[
                    CallArg::Str(text.to_owned()),
                    CallArg::Int(duration.android_length()),
                ],
            )
            .map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Vibration — android.os.Vibrator
// ---------------------------------------------------------------------------

const VIBRATOR_CLASS: &str = "io/tether/android/TetherVibrator";

pub struct AndroidVibrator {
    linker: ObjectLinker,
    _owner: Arc<()>,
}

impl AndroidVibrator {
    pub(crate) fn link() -> Self {
        let owner = Arc::new(());
        let linker = ObjectLinker::link_with(
            &owner,
            VIBRATOR_CLASS,
            || Ok(()),
            |handle| construct_peer(VIBRATOR_CLASS, handle),
        );
        Self {
            linker,
            _owner: owner,
        }
    }
}

impl VibratorBackend for AndroidVibrator {
    fn has_vibrator(&self) -> Result<bool> {
        self.linker
            .invoke("hasVibrator", "()Z", &[])?
            .as_bool()
            .ok_or_else(|| non_bool("hasVibrator"))
    }

    fn vibrate(&self, millis: u64) -> Result<()> {
        self.linker
            .invoke("vibrate", "(J)V", &[CallArg::Long(millis as i64)])
            .map(|_| ())
    }

    fn vibrate_pattern(&self, pattern: &[u64], repeat_from: Option<usize>) -> Result<()> {
        let pattern_json = serde_json::to_string(pattern)?;
        let repeat = repeat_from.map(|i| i as i32).unwrap_or(-1);
        self.linker
            .invoke(
                "vibratePattern",
                "(Ljava/lang/String;I)V",
                &[CallArg::Str(pattern_json), CallArg::Int(repeat)],
            )
            .map(|_| ())
    }

    fn cancel(&self) -> Result<()> {
        self.linker.invoke("cancel", "()V", &[]).map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Offscreen view rendering
// ---------------------------------------------------------------------------

const VIEW_RENDER_CLASS: &str = "io/tether/android/TetherViewRenderer";

pub struct AndroidViewRenderer {
    linker: ObjectLinker,
}

impl AndroidViewRenderer {
    pub(crate) fn link(shared: &Arc<ViewRenderShared>) -> Self {
        let linker = ObjectLinker::link_with(
            shared,
            VIEW_RENDER_CLASS,
            || {
                register_native_table(
                    VIEW_RENDER_CLASS,
                    &NativeMethodTable::new(vec![NativeMethod::new(
                        "onFrameReady",
                        "(J[BII)V",
                        on_frame_ready as *mut c_void,
                    )]),
                )
            },
            |handle| construct_peer(VIEW_RENDER_CLASS, handle),
        );
        Self { linker }
    }
}

impl ViewRenderBackend for AndroidViewRenderer {
    fn begin(&self, width_px: u32, height_px: u32) -> Result<()> {
        let accepted = self
            .linker
            .invoke(
                "begin",
                "(II)Z",
                &[
                    CallArg::Int(width_px as i32),
                    CallArg::Int(height_px as i32),
                ],
            )?
            .as_bool()
            .ok_or_else(|| non_bool("begin"))?;
        if accepted { Ok(()) } else { Err(refused("begin")) }
    }

    fn request_frame(&self) -> Result<()> {
        self.linker.invoke("requestFrame", "()V", &[]).map(|_| ())
    }

    fn end(&self) -> Result<()> {
        self.linker.invoke("end", "()V", &[]).map(|_| ())
    }
}

extern "system" fn on_frame_ready(
    mut env: JNIEnv,
    _class: JClass,
    handle: jlong,
    pixels: JByteArray,
    width_px: jint,
    height_px: jint,
) {
    if width_px <= 0 || height_px <= 0 {
        warn!(width_px, height_px, "frame with impossible geometry dropped");
        return;
    }
    let pixels = match env.convert_byte_array(&pixels) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "frame with unreadable pixel buffer dropped");
            return;
        }
    };
    dispatch_frame(
        PeerHandle::from_jlong(handle),
        width_px as u32,
        height_px as u32,
        pixels,
    );
}
