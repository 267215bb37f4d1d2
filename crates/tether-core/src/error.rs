// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Tether.

use thiserror::Error;

/// Top-level error type for all Tether operations.
#[derive(Debug, Error)]
pub enum TetherError {
    // -- Peer lifecycle --
    #[error("peer construction failed for {class}: {reason}")]
    PeerConstruction { class: String, reason: String },

    #[error("no peer linked — component is permanently degraded")]
    NoPeer,

    // -- Method invocation --
    #[error("remote method not found: {class}.{method}{signature}")]
    MethodNotFound {
        class: String,
        method: String,
        signature: String,
    },

    #[error("signature mismatch calling {method}: {reason}")]
    SignatureMismatch { method: String, reason: String },

    #[error("remote call failed: {0}")]
    RemoteCall(String),

    // -- Signature model --
    #[error("malformed type signature {signature:?}: {reason}")]
    MalformedSignature { signature: String, reason: String },

    // -- Executor --
    #[error("executor is not in a valid state")]
    ExecutorInvalid,

    #[error("wait-for-drain called from the executor's own bound thread")]
    WaitOnBoundThread,

    // -- Platform --
    #[error("feature not available on this platform")]
    PlatformUnavailable,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TetherError>;
