//! Configuration validation functions
//!
//! Checks applied to values loaded from the TOML file before they reach the
//! device or the acceptor.

use crate::error::{Result, TunnelError};
use std::path::Path;

/// Smallest MTU accepted (IPv4 minimum datagram size)
pub const MIN_MTU: u32 = 68;

/// Largest MTU accepted
pub const MAX_MTU: u32 = 65535;

/// Validate MTU value
pub fn validate_mtu(mtu: u32) -> Result<()> {
    if !(MIN_MTU..=MAX_MTU).contains(&mtu) {
        return Err(TunnelError::Config(format!(
            "MTU value {} is out of valid range ({}-{})",
            mtu, MIN_MTU, MAX_MTU
        )));
    }
    Ok(())
}

/// Validate a directory path setting
pub fn validate_dir(field: &str, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(TunnelError::Config(format!("{} cannot be empty", field)));
    }

    if path.to_str().is_none() {
        return Err(TunnelError::Config(format!(
            "{} is not valid UTF-8: {:?}",
            field, path
        )));
    }

    Ok(())
}

/// Validate a control endpoint name (socket file stem or address)
pub fn validate_endpoint_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(TunnelError::Config(
            "Control endpoint name cannot be empty".to_string(),
        ));
    }

    if name.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(TunnelError::Config(format!(
            "Control endpoint name {:?} contains whitespace or control characters",
            name
        )));
    }

    Ok(())
}
