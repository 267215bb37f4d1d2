// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JNI backend for the linking machinery.
//
// Requires the Android NDK. The `JavaVM` pointer comes from
// `ndk_context::android_context()`, set by the NDK glue before any of this
// runs. Threads are attached on demand and stay attached — boundary
// callbacks arrive on runtime-owned threads we do not control.

#![cfg(target_os = "android")]

use std::sync::{Arc, OnceLock};

use jni::objects::{GlobalRef, JClass, JObject, JString, JValue};
use jni::sys::jlong;
use jni::{AttachGuard, JNIEnv, JavaVM};

use tether_core::error::{Result, TetherError};
use tracing::warn;

use crate::executor::ExecutorInner;
use crate::handle::{registry, PeerHandle};
use crate::linker::{NativeMethod, NativeMethodTable, ObjectLinker, PeerBackend};
use crate::signature::{CallArg, CallValue, JavaType, MethodSig};

/// Peer class wrapping a `Handler` on the executor's chosen `Looper`.
pub const EXECUTOR_PEER_CLASS: &str = "io/tether/android/TetherExecutor";

/// All Tether peer classes share this constructor shape: the application
/// `Context` plus the owner's handle.
pub const PEER_CTOR_SIG: &str = "(Landroid/content/Context;J)V";

fn vm() -> Result<&'static JavaVM> {
    static VM: OnceLock<JavaVM> = OnceLock::new();
    if let Some(vm) = VM.get() {
        return Ok(vm);
    }
    let ctx = ndk_context::android_context();
    // SAFETY: `ctx.vm()` is the process-wide `JavaVM*` installed by the NDK
    // glue; it stays valid for the lifetime of the process.
    let vm = unsafe { JavaVM::from_raw(ctx.vm().cast()) }
        .map_err(|e| TetherError::RemoteCall(format!("failed to obtain JavaVM: {e}")))?;
    Ok(VM.get_or_init(|| vm))
}

/// Attach the current thread (if needed) and hand back an env.
pub fn jni_env() -> Result<AttachGuard<'static>> {
    vm()?
        .attach_current_thread()
        .map_err(|e| TetherError::RemoteCall(format!("failed to attach JNI thread: {e}")))
}

/// The hosting application `Context` as a local `JObject`.
pub fn context_object() -> Result<JObject<'static>> {
    let ctx = ndk_context::android_context();
    let ptr = ctx.context();
    if ptr.is_null() {
        return Err(TetherError::RemoteCall(
            "Android context is null — native activity not initialised".into(),
        ));
    }
    // SAFETY: the NDK guarantees this pointer is a valid global jobject for
    // the hosting Context.
    Ok(unsafe { JObject::from_raw(ptr.cast()) })
}

/// Register a peer class's native method table with the runtime. Called from
/// inside the preload gate, so at most once per class per process.
pub fn register_native_table(class: &str, table: &NativeMethodTable) -> Result<()> {
    let mut env = jni_env()?;
    let class_obj = env
        .find_class(class)
        .map_err(|e| TetherError::PeerConstruction {
            class: class.to_owned(),
            reason: format!("find_class: {e}"),
        })?;

    let methods: Vec<jni::NativeMethod> = table
        .entries
        .iter()
        .map(|m| jni::NativeMethod {
            name: m.name.into(),
            sig: m.sig.into(),
            fn_ptr: m.fn_ptr,
        })
        .collect();

    // SAFETY: every fn_ptr in the table is an `extern "system"` function
    // whose parameters match the JNI signature string alongside it.
    unsafe { env.register_native_methods(&class_obj, &methods) }.map_err(|e| {
        TetherError::PeerConstruction {
            class: class.to_owned(),
            reason: format!("register_native_methods: {e}"),
        }
    })
}

/// Construct a peer of `class`, embedding `handle` as the constructor's
/// routing argument, and pin it with a global reference.
pub fn construct_peer(class: &str, handle: PeerHandle) -> Result<Box<dyn PeerBackend>> {
    let mut env = jni_env()?;
    let context = context_object()?;

    let obj = env
        .new_object(
            class,
            PEER_CTOR_SIG,
            &[
                JValue::Object(&context),
                JValue::Long(handle.to_jlong()),
            ],
        )
        .map_err(|e| {
            let reason = match e {
                jni::errors::Error::JavaException => take_exception_message(&mut env),
                other => other.to_string(),
            };
            TetherError::PeerConstruction {
                class: class.to_owned(),
                reason,
            }
        })?;

    let global = env
        .new_global_ref(&obj)
        .map_err(|e| TetherError::PeerConstruction {
            class: class.to_owned(),
            reason: format!("new_global_ref: {e}"),
        })?;

    Ok(Box::new(JniPeer {
        class: class.to_owned(),
        obj: global,
    }))
}

/// A linked peer object held by global reference.
pub struct JniPeer {
    class: String,
    obj: GlobalRef,
}

impl PeerBackend for JniPeer {
    fn class_name(&self) -> &str {
        &self.class
    }

    fn call(&self, method: &str, sig: &MethodSig, args: &[CallArg]) -> Result<CallValue> {
        let mut env = jni_env()?;
        let rendered = sig.render();

        // Temporary peer-owned string references live in `locals` for the
        // duration of the call and are released right after it.
        let mut locals: Vec<JString> = Vec::new();
        for arg in args {
            if let CallArg::Str(s) = arg {
                locals.push(
                    env.new_string(s)
                        .map_err(|e| TetherError::RemoteCall(format!("new_string: {e}")))?,
                );
            }
        }

        let mut jvalues: Vec<JValue> = Vec::with_capacity(args.len());
        let mut next_local = 0;
        for arg in args {
            jvalues.push(match arg {
                CallArg::Bool(v) => JValue::Bool(*v as u8),
                CallArg::Byte(v) => JValue::Byte(*v),
                CallArg::Char(v) => JValue::Char(*v),
                CallArg::Short(v) => JValue::Short(*v),
                CallArg::Int(v) => JValue::Int(*v),
                CallArg::Long(v) => JValue::Long(*v),
                CallArg::Float(v) => JValue::Float(*v),
                CallArg::Double(v) => JValue::Double(*v),
                CallArg::Str(_) => {
                    let value = JValue::Object(&locals[next_local]);
                    next_local += 1;
                    value
                }
            });
        }

        let outcome = env.call_method(&self.obj, method, &rendered, &jvalues);
        let value = match outcome {
            Ok(v) => convert_return(&mut env, &sig.ret, v)?,
            Err(e) => return Err(self.map_call_error(&mut env, method, &rendered, e)),
        };

        for local in locals {
            let _ = env.delete_local_ref(local);
        }
        Ok(value)
    }

    fn notify_native_destroyed(&self) -> Result<()> {
        let mut env = jni_env()?;
        env.call_method(&self.obj, "nativeDestroyed", "()V", &[])
            .map_err(|e| self.map_call_error(&mut env, "nativeDestroyed", "()V", e))?;
        Ok(())
    }
}

impl JniPeer {
    fn map_call_error(
        &self,
        env: &mut JNIEnv<'_>,
        method: &str,
        signature: &str,
        e: jni::errors::Error,
    ) -> TetherError {
        match e {
            jni::errors::Error::MethodNotFound { .. } => TetherError::MethodNotFound {
                class: self.class.clone(),
                method: method.to_owned(),
                signature: signature.to_owned(),
            },
            jni::errors::Error::JavaException => {
                TetherError::RemoteCall(take_exception_message(env))
            }
            other => TetherError::RemoteCall(other.to_string()),
        }
    }
}

/// Invoke a static method on a peer class.
pub fn call_static(
    class: &str,
    method: &str,
    sig: &MethodSig,
    args: &[CallArg],
) -> Result<CallValue> {
    // Static utility calls carry no object arguments in this codebase, so
    // the marshaling is primitives-only.
    let mut env = jni_env()?;
    let rendered = sig.render();

    let jvalues: Vec<JValue> = args
        .iter()
        .map(|arg| match arg {
            CallArg::Bool(v) => Ok(JValue::Bool(*v as u8)),
            CallArg::Byte(v) => Ok(JValue::Byte(*v)),
            CallArg::Char(v) => Ok(JValue::Char(*v)),
            CallArg::Short(v) => Ok(JValue::Short(*v)),
            CallArg::Int(v) => Ok(JValue::Int(*v)),
            CallArg::Long(v) => Ok(JValue::Long(*v)),
            CallArg::Float(v) => Ok(JValue::Float(*v)),
            CallArg::Double(v) => Ok(JValue::Double(*v)),
            CallArg::Str(_) => Err(TetherError::SignatureMismatch {
                method: method.to_owned(),
                reason: "string arguments are not supported on static calls".into(),
            }),
        })
        .collect::<Result<_>>()?;

    let outcome = env
        .call_static_method(class, method, &rendered, &jvalues)
        .map_err(|e| match e {
            jni::errors::Error::MethodNotFound { .. } => TetherError::MethodNotFound {
                class: class.to_owned(),
                method: method.to_owned(),
                signature: rendered.clone(),
            },
            jni::errors::Error::JavaException => {
                TetherError::RemoteCall(take_exception_message(&mut env))
            }
            other => TetherError::RemoteCall(other.to_string()),
        })?;

    convert_return(&mut env, &sig.ret, outcome)
}

/// Unmarshal a call result according to the declared return type. Widths
/// are taken exactly as declared; anything beyond primitives and
/// `java/lang/String` is outside the façade's contract.
fn convert_return(
    env: &mut JNIEnv<'_>,
    ret: &JavaType,
    value: jni::objects::JValueOwned<'_>,
) -> Result<CallValue> {
    let conv = |e: jni::errors::Error| TetherError::RemoteCall(format!("result conversion: {e}"));
    match ret {
        JavaType::Void => Ok(CallValue::Void),
        JavaType::Boolean => Ok(CallValue::Bool(value.z().map_err(conv)?)),
        JavaType::Byte => Ok(CallValue::Byte(value.b().map_err(conv)?)),
        JavaType::Char => Ok(CallValue::Char(value.c().map_err(conv)?)),
        JavaType::Short => Ok(CallValue::Short(value.s().map_err(conv)?)),
        JavaType::Int => Ok(CallValue::Int(value.i().map_err(conv)?)),
        JavaType::Long => Ok(CallValue::Long(value.j().map_err(conv)?)),
        JavaType::Float => Ok(CallValue::Float(value.f().map_err(conv)?)),
        JavaType::Double => Ok(CallValue::Double(value.d().map_err(conv)?)),
        JavaType::Object(name) if name == "java/lang/String" => {
            let obj = value.l().map_err(conv)?;
            if obj.is_null() {
                return Ok(CallValue::Str(None));
            }
            let jstr = JString::from(obj);
            let out: String = env.get_string(&jstr).map_err(conv)?.into();
            let _ = env.delete_local_ref(jstr);
            Ok(CallValue::Str(Some(out)))
        }
        other => Err(TetherError::SignatureMismatch {
            method: "<return>".into(),
            reason: format!("unsupported return type {}", other.render()),
        }),
    }
}

/// Pull the pending Java exception (if any), clear it, and render its
/// `toString()`. Must leave the env exception-free.
fn take_exception_message(env: &mut JNIEnv<'_>) -> String {
    let throwable = match env.exception_occurred() {
        Ok(t) if !t.is_null() => t,
        _ => return "remote call threw (no throwable available)".into(),
    };
    let _ = env.exception_clear();

    let described = env
        .call_method(&throwable, "toString", "()Ljava/lang/String;", &[])
        .ok()
        .and_then(|v| v.l().ok())
        .filter(|obj| !obj.is_null())
        .and_then(|obj| {
            let jstr = JString::from(obj);
            let out: Option<String> = env.get_string(&jstr).ok().map(Into::into);
            let _ = env.delete_local_ref(jstr);
            out
        });

    described.unwrap_or_else(|| "remote call threw (description unavailable)".into())
}

// ---------------------------------------------------------------------------
// Executor loop binding
// ---------------------------------------------------------------------------

/// Link the executor's shared state to its peer. The peer owns a `Handler`
/// on the loop it was constructed on; every `schedule` call posts one
/// runnable that re-enters through [`native_executor_drain`].
pub(crate) fn link_executor_peer(inner: &Arc<ExecutorInner>) -> ObjectLinker {
    ObjectLinker::link_with(
        inner,
        EXECUTOR_PEER_CLASS,
        || {
            register_native_table(
                EXECUTOR_PEER_CLASS,
                &NativeMethodTable::new(vec![NativeMethod::new(
                    "nativeDrain",
                    "(J)V",
                    native_executor_drain as *mut std::ffi::c_void,
                )]),
            )
        },
        |handle| construct_peer(EXECUTOR_PEER_CLASS, handle),
    )
}

/// Entry point for the executor peer's posted runnables.
extern "system" fn native_executor_drain(_env: JNIEnv, _class: JClass, handle: jlong) {
    let handle = PeerHandle::from_jlong(handle);
    match registry().resolve::<ExecutorInner>(handle) {
        Some(inner) => inner.drain_one(),
        None => warn!(%handle, "drain callback after executor teardown — dropped"),
    }
}
