//! Typed errors for the store adapter, the host environment and the engine.
//!
//! Callers at the crate boundary can match on these instead of opaque
//! `anyhow` strings; the binary wraps them with `anyhow` context.

use std::path::PathBuf;

use thiserror::Error;

use crate::window::{TabId, WindowId};

/// Failure reading or writing durable storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("store I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value could not be encoded as JSON.
    #[error("failed to serialize store value: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A stored value exists but does not decode to the expected shape.
    #[error("corrupt record under key '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure reported by the host windowing environment.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("window {0} not found")]
    WindowNotFound(WindowId),

    #[error("tab {0} not found")]
    TabNotFound(TabId),

    /// Any other rejected host call (permission denied, invalid URL, ...).
    #[error("host call failed: {0}")]
    Call(String),
}

/// Error returned by reconciliation operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Host(#[from] HostError),

    /// Private windows are never written to the store.
    #[error("incognito windows cannot be saved")]
    Incognito,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
