// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tether — object linking and cross-boundary dispatch.
//
// Every feature bridge in this workspace is the same machine: a native
// object linked 1:1 to a managed-runtime peer, calls forwarded by name and
// signature, callbacks routed back through an opaque integer handle. This
// crate is that machine, factored out once:
//
// - `handle`    — the process-wide indirection table mapping handles to
//                 live native objects (callbacks look up, never cast).
// - `preload`   — run-once registration of a peer class's native methods.
// - `signature` — the typed model of the name-and-signature call convention.
// - `linker`    — peer lifecycle: construct, hold, two-phase teardown.
// - `executor`  — marshals closures onto a single bound platform thread.
// - `notify`    — the subscription signal that redelivers callbacks to
//                 application code.
//
// The JNI backend lives in `android` and only compiles for Android targets;
// everything else is platform-neutral and covered by host tests.

pub mod executor;
pub mod handle;
pub mod linker;
pub mod notify;
pub mod preload;
pub mod signature;

#[cfg(target_os = "android")]
pub mod android;

pub use executor::{Executor, ExecutorState};
pub use handle::{registry, HandleRegistry, PeerHandle};
pub use linker::{NativeMethod, NativeMethodTable, ObjectLinker, PeerBackend};
pub use notify::{Notifier, Subscription};
pub use preload::{preloads, PreloadRegistry};
pub use signature::{check_args, CallArg, CallValue, JavaType, MethodSig};
