//! ipifc-agent: tunnel device driver and control acceptor
//!
//! This library provides the two OS-facing pieces a tunnel daemon needs: a
//! virtual network interface allocated through the ipifc pseudo-filesystem,
//! and a control endpoint that delivers configuration connections.
//!
//! # Architecture
//!
//! The two components are independent. The daemon that composes them, and
//! everything above them (handshakes, key rotation, routing), lives outside
//! this crate.
//!
//! # Modules
//!
//! - `config`: Configuration parsing and validation
//! - `tun`: Tunnel device, packet I/O, MTU and name queries
//! - `control`: Control endpoint addressing and the accept loop
//! - `ipc`: Status codes returned to control peers
//! - `error`: Error types and handling

#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(not(unix))]
compile_error!("ipifc-agent requires a Unix target");

pub mod config;
pub mod control;
pub mod error;
pub mod ipc;
pub mod tun;

// Re-export commonly used types
pub use control::{ControlAcceptor, ControlAddr, ControlConn};
pub use error::{Result, TunnelError};
pub use ipc::{IpcError, IpcErrorCode};
pub use tun::{DeviceConfig, TunDevice, TunEvent};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
