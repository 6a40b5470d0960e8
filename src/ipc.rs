//! IPC status codes returned to control-protocol peers
//!
//! The codes mirror errno values and are fixed for wire compatibility. A
//! response to a control request ends with an `errno=<code>` line followed by
//! a blank line, where `0` means success.

use crate::error::TunnelError;
use std::fmt;
use std::io;
use thiserror::Error;

/// Reserved status codes for failed control requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum IpcErrorCode {
    /// Input/output failure
    Io = -5,
    /// Malformed request or response
    Protocol = -71,
    /// Request was well formed but not acceptable
    Invalid = -22,
    /// Requested port or endpoint is already in use
    PortInUse = -98,
}

impl IpcErrorCode {
    /// Numeric wire value
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Look up a code by its wire value
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -5 => Some(Self::Io),
            -71 => Some(Self::Protocol),
            -22 => Some(Self::Invalid),
            -98 => Some(Self::PortInUse),
            _ => None,
        }
    }
}

impl fmt::Display for IpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "IO"),
            Self::Protocol => write!(f, "PROTOCOL"),
            Self::Invalid => write!(f, "INVALID"),
            Self::PortInUse => write!(f, "PORT_IN_USE"),
        }
    }
}

/// A failed control request, as reported to the peer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code} (errno={}): {message}", .code.code())]
pub struct IpcError {
    /// Status code sent on the wire
    pub code: IpcErrorCode,
    /// Human readable detail, kept local
    pub message: String,
}

impl IpcError {
    /// Create a new IPC error
    pub fn new(code: IpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<&TunnelError> for IpcError {
    fn from(err: &TunnelError) -> Self {
        let code = match err {
            TunnelError::Listener(e) if e.kind() == io::ErrorKind::AddrInUse => {
                IpcErrorCode::PortInUse
            }
            TunnelError::StatusFormat(_) => IpcErrorCode::Protocol,
            TunnelError::Configuration { .. } | TunnelError::Mtu { .. } | TunnelError::Config(_) => {
                IpcErrorCode::Invalid
            }
            TunnelError::Io(_)
            | TunnelError::Allocation { .. }
            | TunnelError::Teardown { .. }
            | TunnelError::Listener(_)
            | TunnelError::ListenerClosed => IpcErrorCode::Io,
        };
        IpcError::new(code, err.to_string())
    }
}

impl From<TunnelError> for IpcError {
    fn from(err: TunnelError) -> Self {
        IpcError::from(&err)
    }
}

/// Render the trailing status of a control response
pub fn errno_response(error: Option<&IpcError>) -> String {
    let code = error.map_or(0, |e| e.code.code());
    format!("errno={}\n\n", code)
}

/// Extract the status from a control response, if it carries one
pub fn parse_errno(response: &str) -> Option<i64> {
    response
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix("errno="))
        .and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values() {
        assert_eq!(IpcErrorCode::Io.code(), -5);
        assert_eq!(IpcErrorCode::Protocol.code(), -71);
        assert_eq!(IpcErrorCode::Invalid.code(), -22);
        assert_eq!(IpcErrorCode::PortInUse.code(), -98);
    }

    #[test]
    fn test_from_code() {
        for code in [
            IpcErrorCode::Io,
            IpcErrorCode::Protocol,
            IpcErrorCode::Invalid,
            IpcErrorCode::PortInUse,
        ] {
            assert_eq!(IpcErrorCode::from_code(code.code()), Some(code));
        }
        assert_eq!(IpcErrorCode::from_code(0), None);
        assert_eq!(IpcErrorCode::from_code(5), None);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(IpcErrorCode::PortInUse.to_string(), "PORT_IN_USE");
        let err = IpcError::new(IpcErrorCode::Invalid, "bad mtu");
        assert_eq!(err.to_string(), "INVALID (errno=-22): bad mtu");
    }

    #[test]
    fn test_error_mapping() {
        let addr_in_use = TunnelError::Listener(io::Error::from(io::ErrorKind::AddrInUse));
        assert_eq!(IpcError::from(&addr_in_use).code, IpcErrorCode::PortInUse);

        let refused = TunnelError::Listener(io::Error::from(io::ErrorKind::PermissionDenied));
        assert_eq!(IpcError::from(&refused).code, IpcErrorCode::Io);

        let status = TunnelError::StatusFormat("short".to_string());
        assert_eq!(IpcError::from(status).code, IpcErrorCode::Protocol);

        let mtu = TunnelError::Mtu {
            mtu: 1,
            source: io::Error::from(io::ErrorKind::InvalidInput),
        };
        assert_eq!(IpcError::from(&mtu).code, IpcErrorCode::Invalid);

        let io_err = TunnelError::Io(io::Error::from(io::ErrorKind::BrokenPipe));
        assert_eq!(IpcError::from(&io_err).code, IpcErrorCode::Io);
    }

    #[test]
    fn test_errno_response() {
        assert_eq!(errno_response(None), "errno=0\n\n");
        let err = IpcError::new(IpcErrorCode::Io, "closed");
        assert_eq!(errno_response(Some(&err)), "errno=-5\n\n");
    }

    #[test]
    fn test_parse_errno() {
        assert_eq!(parse_errno("listen_port=51820\nerrno=0\n\n"), Some(0));
        assert_eq!(parse_errno("errno=-98\n\n"), Some(-98));
        assert_eq!(parse_errno("listen_port=51820\n"), None);
        assert_eq!(parse_errno("errno=abc\n"), None);
    }
}
