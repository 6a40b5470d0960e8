//! Configuration management
//!
//! This module handles parsing and validation of the TOML configuration that
//! locates the ipifc tree and the control socket directory.

mod validation;

pub use validation::{validate_endpoint_name, validate_mtu, MAX_MTU, MIN_MTU};

use crate::control::ControlAddr;
use crate::error::{Result, TunnelError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the ipifc pseudo-filesystem
pub const DEFAULT_IPIFC_ROOT: &str = "/net/ipifc";

/// Default directory for control sockets
pub const DEFAULT_SOCKET_DIR: &str = "/var/run/wireguard";

/// Default interface MTU
pub const DEFAULT_MTU: u32 = 1420;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Tunnel device settings
    #[serde(default)]
    pub tun: TunSettings,

    /// Control endpoint settings
    #[serde(default)]
    pub control: ControlSettings,
}

/// Tunnel device settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TunSettings {
    /// Directory holding `clone` and the per-index interface directories
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// MTU requested when the interface is created
    #[serde(default = "default_mtu")]
    pub mtu: u32,
}

/// Control endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ControlSettings {
    /// Directory in which named control sockets are created
    #[serde(default = "default_socket_dir")]
    pub socket_dir: PathBuf,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            TunnelError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config = Self::from_toml_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        toml::from_str(toml)
            .map_err(|e| TunnelError::Config(format!("Failed to parse TOML config: {}", e)))
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_dir("tun.root", &self.tun.root)?;
        validation::validate_mtu(self.tun.mtu)?;
        validation::validate_dir("control.socket_dir", &self.control.socket_dir)?;
        Ok(())
    }
}

impl Default for TunSettings {
    fn default() -> Self {
        Self {
            root: default_root(),
            mtu: default_mtu(),
        }
    }
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            socket_dir: default_socket_dir(),
        }
    }
}

impl ControlSettings {
    /// Resolve a control endpoint name against the configured socket directory
    pub fn resolve(&self, name: &str) -> Result<ControlAddr> {
        validation::validate_endpoint_name(name)?;
        let addr = ControlAddr::resolve(name, &self.socket_dir);
        if let ControlAddr::Tcp(socket_addr) = &addr {
            if !socket_addr.ip().is_loopback() {
                return Err(TunnelError::Config(format!(
                    "Control endpoint {} is not a loopback address",
                    socket_addr
                )));
            }
        }
        Ok(addr)
    }
}

// Default value functions for serde
fn default_root() -> PathBuf {
    PathBuf::from(DEFAULT_IPIFC_ROOT)
}

fn default_mtu() -> u32 {
    DEFAULT_MTU
}

fn default_socket_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SOCKET_DIR)
}
