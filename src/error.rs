//! Error types for ipifc-agent
//!
//! Every fallible operation in the crate returns [`TunnelError`]. Allocation,
//! configuration and parse failures are separate variants so callers can tell
//! a negotiation problem from a transport problem.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tunnel device and control acceptor operations
#[derive(Error, Debug)]
pub enum TunnelError {
    /// Opening or reading the clone device (or opening the data file) failed
    #[error("Interface allocation failed at {path:?}: {source}")]
    Allocation {
        /// File that could not be opened or read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Writing a control command failed
    #[error("Interface configuration failed ({command}): {source}")]
    Configuration {
        /// Command text that was being written
        command: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Setting the MTU was rejected
    #[error("Setting MTU to {mtu} failed: {source}")]
    Mtu {
        /// Requested MTU
        mtu: u32,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Packet or status I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The interface status file did not have the expected shape
    #[error("Malformed interface status: {0}")]
    StatusFormat(String),

    /// One or both handles failed to close
    #[error("Device teardown failed (data: {data:?}, control: {control:?})")]
    Teardown {
        /// Error closing the data handle, if any
        data: Option<io::Error>,
        /// Error closing the control handle, if any
        control: Option<io::Error>,
    },

    /// Binding or accepting on the control endpoint failed
    #[error("Control listener error: {0}")]
    Listener(#[source] io::Error),

    /// The control listener has been closed
    #[error("Control listener closed")]
    ListenerClosed,

    /// Configuration-file errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using TunnelError
pub type Result<T> = std::result::Result<T, TunnelError>;

impl TunnelError {
    /// Whether this error came from the OS I/O layer rather than from a
    /// protocol or configuration problem
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            TunnelError::Io(_)
                | TunnelError::Allocation { .. }
                | TunnelError::Teardown { .. }
                | TunnelError::Listener(_)
        )
    }
}

impl From<toml::de::Error> for TunnelError {
    fn from(err: toml::de::Error) -> Self {
        TunnelError::Config(err.to_string())
    }
}
