//! Error types for themeprobe
//!
//! Transport timeouts are separate variants so callers can tell a silent remote
//! apart from a remote that replied with an application-level error.

use std::time::Duration;
use thiserror::Error;

/// Main error type for the probe library
#[derive(Error, Debug)]
pub enum Error {
    /// No addressable root container; aborts the whole run
    #[error("Setup failure: {0}")]
    Setup(String),

    /// Configuration store read/write failure
    #[error("Theme adapter error: {0}")]
    Adapter(String),

    /// Path does not address a scalar slot in the document
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Mutation cycle failed; the original value was restored
    #[error("Probe of '{path}' failed: {reason}")]
    Probe { path: String, reason: String },

    /// Restoration failed; the document may still hold a signal value
    #[error("Failed to restore '{path}': {reason}")]
    RestoreFailed { path: String, reason: String },

    /// No READY within the connect timeout
    #[error("Timed out after {0:?} waiting for READY")]
    ConnectTimeout(Duration),

    /// No RESULT within the run timeout
    #[error("Timed out after {0:?} waiting for RESULT")]
    RunTimeout(Duration),

    /// Remote side replied with an `error` payload
    #[error("Remote probe failed: {0}")]
    Remote(String),

    /// Peer context went away
    #[error("Transport channel closed")]
    ChannelClosed,

    /// Well-formed but unexpected reply
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Common(#[from] themeprobe_common::Error),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for transport-level timeouts
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::ConnectTimeout(_) | Error::RunTimeout(_))
    }
}

/// Convenience Result type using the themeprobe Error
pub type Result<T> = std::result::Result<T, Error>;
