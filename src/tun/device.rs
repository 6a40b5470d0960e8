//! Tunnel device backed by the ipifc pseudo-filesystem
//!
//! Creating a device opens `<root>/clone`, which allocates a fresh interface
//! and reports its index. The clone file stays open as the control handle and
//! `<root>/<index>/data` carries raw packets.

use crate::config::{TunSettings, DEFAULT_IPIFC_ROOT, DEFAULT_MTU};
use crate::error::{Result, TunnelError};
use crate::tun::handles::{abandon, HandlePair};
use crate::tun::name::NameCache;
use crate::tun::status;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Clone file name under the ipifc root
const CLONE_FILE: &str = "clone";

/// Packet file name under an interface directory
const DATA_FILE: &str = "data";

/// Status file name under an interface directory
const STATUS_FILE: &str = "status";

/// Binding command: raw packets, no extra framing
const BIND_COMMAND: &str = "bind pkt";

/// Tunnel device configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Directory holding the clone file and interface directories
    pub root: PathBuf,
    /// MTU to set on the new interface
    pub mtu: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_IPIFC_ROOT),
            mtu: DEFAULT_MTU,
        }
    }
}

impl From<&TunSettings> for DeviceConfig {
    fn from(settings: &TunSettings) -> Self {
        Self {
            root: settings.root.clone(),
            mtu: settings.mtu,
        }
    }
}

/// Device-level events delivered to the owning daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunEvent {
    /// Interface came up
    Up,
    /// Interface went down
    Down,
    /// Interface MTU changed
    MtuUpdate,
}

/// A virtual network interface allocated through the clone device
#[derive(Debug)]
pub struct TunDevice {
    handles: HandlePair,
    index: u32,
    root: PathBuf,
    name: NameCache,
    events_tx: mpsc::UnboundedSender<TunEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<TunEvent>>,
    errors_tx: mpsc::UnboundedSender<TunnelError>,
    errors_rx: Option<mpsc::UnboundedReceiver<TunnelError>>,
}

impl TunDevice {
    /// Create a device under the default ipifc root
    pub fn create(name: &str, mtu: u32) -> Result<Self> {
        Self::create_with(
            name,
            &DeviceConfig {
                mtu,
                ..DeviceConfig::default()
            },
        )
    }

    /// Create a device using an explicit configuration
    ///
    /// Either a fully configured device is returned or every handle opened
    /// along the way is closed before the error is reported.
    pub fn create_with(name: &str, config: &DeviceConfig) -> Result<Self> {
        info!(
            "Creating tunnel device (requested name: {}, root: {:?})",
            name, config.root
        );

        let clone_path = config.root.join(CLONE_FILE);
        let mut ctl = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&clone_path)
            .map_err(|source| TunnelError::Allocation {
                path: clone_path.clone(),
                source,
            })?;

        let index = match read_index(&mut ctl) {
            Ok(index) => index,
            Err(source) => {
                abandon([ctl]);
                return Err(TunnelError::Allocation {
                    path: clone_path,
                    source,
                });
            }
        };
        debug!("Clone device allocated interface {}", index);

        let data_path = interface_dir(&config.root, index).join(DATA_FILE);
        let data = match OpenOptions::new().read(true).write(true).open(&data_path) {
            Ok(data) => data,
            Err(source) => {
                abandon([ctl]);
                return Err(TunnelError::Allocation {
                    path: data_path,
                    source,
                });
            }
        };

        let mut handles = HandlePair::new(ctl, data);
        info!("Setting MTU of interface {} to {}", index, config.mtu);
        configure_or_close(&mut handles, config.mtu)?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();

        info!("Tunnel device {} created", index);

        Ok(Self {
            handles,
            index,
            root: config.root.clone(),
            name: NameCache::new(),
            events_tx,
            events_rx: Some(events_rx),
            errors_tx,
            errors_rx: Some(errors_rx),
        })
    }

    /// Read one packet into `buf[offset..]`
    pub fn read(&mut self, buf: &mut [u8], offset: usize) -> Result<usize> {
        let len = buf.len();
        let buf = buf.get_mut(offset..).ok_or_else(|| offset_error(offset, len))?;
        Ok(self.handles.data()?.read(buf)?)
    }

    /// Write `buf[offset..]` with a single write on the data handle
    pub fn write(&mut self, buf: &[u8], offset: usize) -> Result<usize> {
        let buf = buf.get(offset..).ok_or_else(|| offset_error(offset, buf.len()))?;
        Ok(self.handles.data()?.write(buf)?)
    }

    /// Writes are never batched, so there is nothing to flush
    pub fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Read the current MTU from the interface status file
    ///
    /// The value is taken from the OS on every call, so changes made by other
    /// processes are visible. The status file reports the MTU as configured,
    /// without rounding.
    pub fn mtu(&self) -> Result<u32> {
        let path = interface_dir(&self.root, self.index).join(STATUS_FILE);
        let contents = fs::read_to_string(&path)?;
        let mtu = status::parse_mtu(&contents)?;
        debug!("Read MTU {} for interface {}", mtu, self.index);
        Ok(mtu)
    }

    /// Interface name; on ipifc this is the decimal interface index
    pub fn name(&self) -> Result<String> {
        let index = self.index;
        let name = self.name.get_or_compute(|| Ok(index.to_string()))?;
        Ok(name.to_string())
    }

    /// Interface index assigned by the clone device
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The ipifc root this device was created under
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Take the receiving end of the event channel
    ///
    /// Returns `None` once the receiver has been handed out.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<TunEvent>> {
        self.events_rx.take()
    }

    /// Take the receiving end of the device error channel
    pub fn take_errors(&mut self) -> Option<mpsc::UnboundedReceiver<TunnelError>> {
        self.errors_rx.take()
    }

    /// Producer for device events, for whatever watches the interface state
    pub fn event_sender(&self) -> mpsc::UnboundedSender<TunEvent> {
        self.events_tx.clone()
    }

    /// Producer for asynchronous device errors
    pub fn error_sender(&self) -> mpsc::UnboundedSender<TunnelError> {
        self.errors_tx.clone()
    }

    /// Close the data handle and then the control handle
    ///
    /// Both handles are closed even if the first close fails, and both
    /// outcomes are reported. Calling this again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.handles.is_closed() {
            return Ok(());
        }
        info!("Closing tunnel device {}", self.index);
        self.handles.close()
    }
}

impl Drop for TunDevice {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Error closing tunnel device {} on drop: {}", self.index, e);
        }
    }
}

fn interface_dir(root: &Path, index: u32) -> PathBuf {
    root.join(index.to_string())
}

fn read_index(ctl: &mut File) -> io::Result<u32> {
    let mut contents = String::new();
    ctl.read_to_string(&mut contents)?;
    let trimmed = contents.trim();
    trimmed.parse::<u32>().map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("clone device returned {:?}: {}", trimmed, e),
        )
    })
}

/// Issue the setup commands, closing both handles if either is rejected
fn configure_or_close(handles: &mut HandlePair, mtu: u32) -> Result<()> {
    let result = handles
        .ctl()
        .map_err(TunnelError::from)
        .and_then(|ctl| configure(ctl, mtu));

    if result.is_err() {
        if let Err(e) = handles.close() {
            warn!("Failed to close handles after rejected configuration: {}", e);
        }
    }
    result
}

/// Bind the interface in packet mode and set its MTU
fn configure<W: Write>(ctl: &mut W, mtu: u32) -> Result<()> {
    write_command(ctl, BIND_COMMAND).map_err(|source| TunnelError::Configuration {
        command: BIND_COMMAND.to_string(),
        source,
    })?;
    write_command(ctl, &format!("mtu {}", mtu)).map_err(|source| TunnelError::Mtu { mtu, source })
}

/// Write a control command as exactly one write
fn write_command<W: Write>(ctl: &mut W, command: &str) -> io::Result<()> {
    debug!("Writing control command {:?}", command);
    let written = ctl.write(command.as_bytes())?;
    if written != command.len() {
        return Err(io::Error::new(
            io::ErrorKind::WriteZero,
            format!(
                "short write of control command {:?} ({} of {} bytes)",
                command,
                written,
                command.len()
            ),
        ));
    }
    Ok(())
}

fn offset_error(offset: usize, len: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("offset {} is past the end of a {} byte buffer", offset, len),
    )
}
